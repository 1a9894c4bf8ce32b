use aws_config::{BehaviorVersion, SdkConfig};
use lambda_runtime::{service_fn, tracing, LambdaEvent};
use model::{Error, IncomingEvent};
use profiler::Profiler;
use profiler_codeguru::CodeGuruReporter;
use std::sync::Arc;
use storage_s3::S3ObjectStore;
use workflow::config::WorkflowConfig;
use workflow::invocation_fn;
use workflow::runtime::WorkflowRuntime;

async fn build_runtime(config: WorkflowConfig, sdk_config: &SdkConfig) -> WorkflowRuntime {
    let store: S3ObjectStore = S3ObjectStore::new(aws_sdk_s3::Client::new(sdk_config));
    let reporter: Arc<CodeGuruReporter> = Arc::new(CodeGuruReporter::new(
        sdk_config,
        config.profiling_target_region.clone(),
    ));
    let profiler: Profiler = Profiler::new(config.profiler_settings(), reporter.clone());

    if let Some(profiling_group) = profiler.profiling_group() {
        if let Err(err) = reporter.configure_agent(profiling_group).await {
            tracing::warn!(
                profiling_group,
                error = %err,
                "Failed to configure profiling agent, reporting every profile"
            );
        }
    }

    WorkflowRuntime::new(config, Arc::new(store), profiler)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let config: WorkflowConfig = WorkflowConfig::from_env()?;

    tracing::info!(
        profiling_group = ?config.profiling_group_name,
        profiling_enabled = config.profiling_enabled,
        bucket = ?config.bucket_name,
        queue_url = ?config.queue_url,
        "Initialising profiled workflow"
    );

    let sdk_config: SdkConfig = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let runtime: WorkflowRuntime = build_runtime(config, &sdk_config).await;

    lambda_runtime::run(service_fn(|event: LambdaEvent<IncomingEvent>| {
        invocation_fn(&runtime, event)
    }))
    .await
}
