use model::env::{
    BUCKET_NAME, CPU_TASK_ITERATIONS, PROFILING_ENABLED, PROFILING_GROUP_NAME,
    PROFILING_TARGET_REGION, QUEUE_URL,
};
use profiler::ProfilerSettings;
use std::fmt::{Display, Formatter};

pub const DEFAULT_COMPUTE_ITERATIONS: u64 = 1_000_000;

/// Configuration read once at cold start.
///
/// Values that are only needed by a particular step stay optional here
/// and are checked when the step runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub profiling_group_name: Option<String>,
    pub profiling_enabled: bool,
    pub profiling_target_region: Option<String>,
    pub bucket_name: Option<String>,
    pub queue_url: Option<String>,
    pub compute_iterations: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        WorkflowConfig {
            profiling_group_name: None,
            profiling_enabled: true,
            profiling_target_region: None,
            bucket_name: None,
            queue_url: None,
            compute_iterations: DEFAULT_COMPUTE_ITERATIONS,
        }
    }
}

impl WorkflowConfig {
    /// Pull configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        WorkflowConfig::from_vars(|name| std::env::var(name).ok())
    }

    /// Build configuration from any variable lookup. Empty values count as unset.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let profiling_enabled: bool = match var(PROFILING_ENABLED) {
            None => true,
            Some(value) => parse_flag(PROFILING_ENABLED, value)?,
        };

        let compute_iterations: u64 = match var(CPU_TASK_ITERATIONS) {
            None => DEFAULT_COMPUTE_ITERATIONS,
            Some(value) => value.trim().parse().map_err(|err: std::num::ParseIntError| {
                ConfigError::new(CPU_TASK_ITERATIONS, value.clone(), err.to_string())
            })?,
        };

        Ok(WorkflowConfig {
            profiling_group_name: var(PROFILING_GROUP_NAME),
            profiling_enabled,
            profiling_target_region: var(PROFILING_TARGET_REGION),
            bucket_name: var(BUCKET_NAME),
            queue_url: var(QUEUE_URL),
            compute_iterations,
        })
    }

    pub fn profiler_settings(&self) -> ProfilerSettings {
        ProfilerSettings {
            profiling_group_name: self.profiling_group_name.clone(),
            enabled: self.profiling_enabled,
        }
    }
}

fn parse_flag(variable: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::new(
            variable,
            value,
            "expected TRUE or FALSE".to_string(),
        )),
    }
}

/// An environment variable held a value that couldn't be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
    pub reason: String,
}

impl ConfigError {
    fn new(variable: &'static str, value: String, reason: String) -> Self {
        ConfigError {
            variable,
            value,
            reason,
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid value [{}] for {}: {}",
            self.value, self.variable, self.reason
        )
    }
}

impl std::error::Error for ConfigError {}
