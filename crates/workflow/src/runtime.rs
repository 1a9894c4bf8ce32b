use crate::config::WorkflowConfig;
use crate::steps;
use lambda_runtime::tracing;
use lambda_runtime::tracing::{Instrument, Span};
use model::invocation::{InvocationContext, InvocationId};
use model::step::StepName;
use model::{IncomingEvent, StepExecutionError, WorkflowResult};
use profiler::{Profiler, ProfilingSession, WorkKind};
use std::sync::Arc;
use std::time::Instant;
use storage::ObjectStore;

/// Everything an invocation needs, built once at cold start and shared
/// read-only between invocations.
pub struct WorkflowRuntime {
    config: WorkflowConfig,
    store: Arc<dyn ObjectStore>,
    profiler: Profiler,
}

impl WorkflowRuntime {
    pub fn new(config: WorkflowConfig, store: Arc<dyn ObjectStore>, profiler: Profiler) -> Self {
        WorkflowRuntime {
            config,
            store,
            profiler,
        }
    }

    /// Run every step in order for one invocation.
    ///
    /// A profiling session spans the whole run and is finished whether
    /// the steps succeed or not. Step failures are logged and returned
    /// unchanged.
    pub async fn run(
        &self,
        event: &IncomingEvent,
        ctx: &InvocationContext,
    ) -> Result<WorkflowResult, StepExecutionError> {
        let workflow_span: Span = tracing::span!(
            tracing::Level::INFO,
            "Workflow",
            request_id = ctx.request_id(),
            function_arn = ctx.function_arn(),
            region = ctx.region()
        );

        async {
            tracing::info!("Starting new invocation");
            tracing::info!(
                record_count = event.records().len(),
                records = ?event.records(),
                "Parsed queue records from event"
            );

            let mut session: ProfilingSession = self.profiler.start(ctx.invocation_id());
            let outcome: Result<WorkflowResult, StepExecutionError> =
                self.run_steps(event, &mut session).await;
            session.finish(outcome.is_ok()).await;

            match &outcome {
                Ok(result) => {
                    tracing::info!(result = ?result, "Function completed successfully")
                }
                Err(err) => tracing::warn!(
                    step = %err.step,
                    error = %err,
                    cause_chain = ?err.cause_chain(),
                    cause = ?err.cause,
                    "Error in Lambda function"
                ),
            }

            outcome
        }
        .instrument(workflow_span)
        .await
    }

    async fn run_steps(
        &self,
        event: &IncomingEvent,
        session: &mut ProfilingSession,
    ) -> Result<WorkflowResult, StepExecutionError> {
        let started: Instant = Instant::now();
        let cpu_result = steps::compute(self.config.compute_iterations);
        session.record(StepName::Compute.as_str(), WorkKind::Cpu, started.elapsed());
        let cpu_result: u64 = cpu_result?;

        let started: Instant = Instant::now();
        let io_result =
            steps::storage_round_trip(self.store.as_ref(), self.config.bucket_name.as_deref())
                .await;
        session.record(StepName::Storage.as_str(), WorkKind::Io, started.elapsed());
        let io_result: String = io_result?;

        let started: Instant = Instant::now();
        let sqs_results: Vec<String> = steps::process_messages(event);
        session.record(
            StepName::MessageProcessing.as_str(),
            WorkKind::Cpu,
            started.elapsed(),
        );

        Ok(WorkflowResult {
            cpu_result,
            io_result,
            sqs_results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::{PLACEHOLDER_MESSAGE, STORAGE_PAYLOAD};
    use lambda_runtime::tracing::subscriber::util::SubscriberInitExt;
    use profiler::{Profile, ProfilerSettings};
    use std::sync::Mutex;
    use storage_in_memory::InMemoryObjectStore;
    use test_utils::{
        event_with_bodies, test_invocation_context, RecordingReporter, TEST_BUCKET,
        TEST_REQUEST_ID,
    };

    const ITERATIONS: u64 = 1000;

    /// Log output written by the fmt subscriber during a test.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn lines(&self) -> Vec<String> {
            let buffer = self.0.lock().expect("Log buffer should not be poisoned");

            String::from_utf8_lossy(&buffer)
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0
                .lock()
                .expect("Log buffer should not be poisoned")
                .extend_from_slice(buf);

            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    async fn run_capturing_logs(
        runtime: &WorkflowRuntime,
        event: &IncomingEvent,
    ) -> (Result<WorkflowResult, StepExecutionError>, Vec<String>) {
        let logs: CapturedLogs = CapturedLogs::default();
        let writer: CapturedLogs = logs.clone();
        let _guard = tracing::subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish()
            .set_default();

        let outcome = runtime.run(event, &test_invocation_context()).await;

        (outcome, logs.lines())
    }

    fn test_config() -> WorkflowConfig {
        WorkflowConfig {
            profiling_group_name: Some("test-group".to_string()),
            bucket_name: Some(TEST_BUCKET.to_string()),
            compute_iterations: ITERATIONS,
            ..Default::default()
        }
    }

    fn runtime_with(
        config: WorkflowConfig,
        store: InMemoryObjectStore,
        reporter: Arc<RecordingReporter>,
    ) -> WorkflowRuntime {
        let profiler: Profiler = Profiler::new(config.profiler_settings(), reporter);

        WorkflowRuntime::new(config, Arc::new(store), profiler)
    }

    #[tokio::test]
    async fn runs_every_step_for_queue_event() {
        let reporter: Arc<RecordingReporter> = Arc::new(RecordingReporter::default());
        let runtime: WorkflowRuntime =
            runtime_with(test_config(), InMemoryObjectStore::default(), reporter.clone());

        let result: WorkflowResult = runtime
            .run(&event_with_bodies(&["hello", "world"]), &test_invocation_context())
            .await
            .expect("Workflow should succeed");

        assert_eq!(
            WorkflowResult {
                cpu_result: steps::compute(ITERATIONS).expect("Compute should succeed"),
                io_result: STORAGE_PAYLOAD.to_string(),
                sqs_results: vec!["Processed: hello".to_string(), "Processed: world".to_string()],
            },
            result
        );
    }

    #[tokio::test]
    async fn empty_event_uses_placeholder_message() {
        let runtime: WorkflowRuntime = runtime_with(
            test_config(),
            InMemoryObjectStore::default(),
            Arc::new(RecordingReporter::default()),
        );

        let result: WorkflowResult = runtime
            .run(&IncomingEvent::default(), &test_invocation_context())
            .await
            .expect("Workflow should succeed");

        assert_eq!(vec![format!("Processed: {PLACEHOLDER_MESSAGE}")], result.sqs_results);
    }

    #[tokio::test]
    async fn successful_run_reports_one_profile() {
        let reporter: Arc<RecordingReporter> = Arc::new(RecordingReporter::default());
        let runtime: WorkflowRuntime =
            runtime_with(test_config(), InMemoryObjectStore::default(), reporter.clone());

        runtime
            .run(&IncomingEvent::default(), &test_invocation_context())
            .await
            .expect("Workflow should succeed");

        let profiles: Vec<Profile> = reporter.profiles();
        assert_eq!(1, profiles.len());

        let profile: &Profile = &profiles[0];
        assert!(profile.succeeded);
        assert_eq!("test-group", profile.profiling_group);
        assert_eq!(test_invocation_context().request_id(), profile.request_id);

        let steps: Vec<&str> = profile.steps.iter().map(|t| t.step.as_str()).collect();
        assert_eq!(vec!["compute", "storage", "message_processing"], steps);
    }

    #[tokio::test]
    async fn storage_failure_fails_workflow_and_still_reports() {
        let reporter: Arc<RecordingReporter> = Arc::new(RecordingReporter::default());
        let runtime: WorkflowRuntime = runtime_with(
            test_config(),
            InMemoryObjectStore::failing_gets(),
            reporter.clone(),
        );

        let err: StepExecutionError = runtime
            .run(&event_with_bodies(&["hello"]), &test_invocation_context())
            .await
            .expect_err("Workflow should fail");

        assert_eq!(StepName::Storage, err.step);

        let profiles: Vec<Profile> = reporter.profiles();
        assert_eq!(1, profiles.len());
        assert!(!profiles[0].succeeded);
        // Message processing never ran
        assert_eq!(2, profiles[0].steps.len());
    }

    #[tokio::test]
    async fn missing_bucket_fails_with_storage_error() {
        let config: WorkflowConfig = WorkflowConfig {
            bucket_name: None,
            ..test_config()
        };
        let runtime: WorkflowRuntime = runtime_with(
            config,
            InMemoryObjectStore::default(),
            Arc::new(RecordingReporter::default()),
        );

        let err: StepExecutionError = runtime
            .run(&IncomingEvent::default(), &test_invocation_context())
            .await
            .expect_err("Workflow should fail");

        assert_eq!(StepName::Storage, err.step);
    }

    #[tokio::test]
    async fn missing_profiling_group_runs_without_profiling() {
        let reporter: Arc<RecordingReporter> = Arc::new(RecordingReporter::default());
        let config: WorkflowConfig = WorkflowConfig {
            profiling_group_name: None,
            ..test_config()
        };
        let runtime: WorkflowRuntime =
            runtime_with(config, InMemoryObjectStore::default(), reporter.clone());

        runtime
            .run(&IncomingEvent::default(), &test_invocation_context())
            .await
            .expect("Workflow should succeed without profiling");

        assert!(reporter.profiles().is_empty());
    }

    #[test]
    fn profiler_settings_follow_config() {
        let settings: ProfilerSettings = test_config().profiler_settings();

        assert!(settings.enabled);
        assert_eq!(Some("test-group".to_string()), settings.profiling_group_name);
    }

    #[tokio::test]
    async fn every_log_line_carries_request_id() {
        let runtime: WorkflowRuntime = runtime_with(
            test_config(),
            InMemoryObjectStore::default(),
            Arc::new(RecordingReporter::default()),
        );

        let (outcome, lines) =
            run_capturing_logs(&runtime, &event_with_bodies(&["hello"])).await;

        outcome.expect("Workflow should succeed");
        assert!(!lines.is_empty());
        for line in &lines {
            assert!(line.contains(TEST_REQUEST_ID), "Uncorrelated log line: {line}");
        }

        let logged = |message: &str| lines.iter().any(|line| line.contains(message));
        assert!(logged("Parsed queue records from event"));
        assert!(logged("Completed CPU-intensive task"));
        assert!(logged("Completed I/O-intensive task"));
        assert!(logged("Completed message processing"));
        assert!(logged("Function completed successfully"));
    }

    #[tokio::test]
    async fn storage_failure_logs_warning_with_cause_chain() {
        let runtime: WorkflowRuntime = runtime_with(
            test_config(),
            InMemoryObjectStore::failing_gets(),
            Arc::new(RecordingReporter::default()),
        );

        let (outcome, lines) =
            run_capturing_logs(&runtime, &event_with_bodies(&["hello"])).await;

        outcome.expect_err("Workflow should fail");

        let warnings: Vec<&String> = lines.iter().filter(|line| line.contains("WARN")).collect();
        assert_eq!(2, warnings.len(), "Unexpected warnings: {warnings:?}");
        assert!(warnings.iter().all(|line| line.contains(TEST_REQUEST_ID)));
        assert!(warnings.iter().any(|line| {
            line.contains("Error in Lambda function")
                && line.contains("step=storage")
                && line.contains("cause_chain=")
                && line.contains("GetObject")
        }));
    }

    #[tokio::test]
    async fn compute_failure_logs_warning_in_step_and_runtime() {
        let config: WorkflowConfig = WorkflowConfig {
            compute_iterations: u64::MAX,
            ..test_config()
        };
        let runtime: WorkflowRuntime = runtime_with(
            config,
            InMemoryObjectStore::default(),
            Arc::new(RecordingReporter::default()),
        );

        let (outcome, lines) = run_capturing_logs(&runtime, &IncomingEvent::default()).await;

        let err: StepExecutionError = outcome.expect_err("Workflow should fail");
        assert_eq!(StepName::Compute, err.step);

        let warned = |message: &str| {
            lines
                .iter()
                .any(|line| line.contains("WARN") && line.contains(message))
        };
        assert!(warned("Error in CPU-intensive task"));
        assert!(warned("step=compute"));
    }
}
