/// Name of the CodeGuru profiling group the function reports to
pub const PROFILING_GROUP_NAME: &str = "CODEGURU_PROFILER_GROUP_NAME";
/// Whether profiling is switched on, `TRUE` when deployed
pub const PROFILING_ENABLED: &str = "AWS_CODEGURU_PROFILER_ENABLED";
/// Region the profiling group lives in
pub const PROFILING_TARGET_REGION: &str = "AWS_CODEGURU_PROFILER_TARGET_REGION";
/// Bucket used for the storage round trip
pub const BUCKET_NAME: &str = "BUCKET_NAME";
/// Queue wired as the event source
pub const QUEUE_URL: &str = "QUEUE_URL";
/// Size of the range summed by the compute step
pub const CPU_TASK_ITERATIONS: &str = "CPU_TASK_ITERATIONS";
