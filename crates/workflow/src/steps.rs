//! The individual steps of the workflow.
//!
//! Steps only know their own inputs. Ordering, timing and profiling are
//! handled by `WorkflowRuntime`.

use lambda_runtime::tracing;
use model::env::BUCKET_NAME;
use model::step::StepName;
use model::{IncomingEvent, StepExecutionError};
use storage::ObjectStore;

pub const STORAGE_KEY: &str = "test.txt";
pub const STORAGE_PAYLOAD: &str = "Hello, World!";
pub const PLACEHOLDER_MESSAGE: &str = "Test message (no SQS event)";

/// Sum of `i * i` for `i` in `[0, iterations)`.
pub fn compute(iterations: u64) -> Result<u64, StepExecutionError> {
    tracing::info!(iterations, "Starting CPU-intensive task");

    let result: u64 = (0..iterations)
        .try_fold(0u64, |acc, i| i.checked_mul(i).and_then(|sq| acc.checked_add(sq)))
        .ok_or_else(|| {
            let err: StepExecutionError = StepExecutionError::new(
                StepName::Compute,
                format!("sum of squares below {iterations} overflows u64"),
            );
            tracing::warn!(error = %err, "Error in CPU-intensive task");

            err
        })?;

    tracing::info!(result, "Completed CPU-intensive task");

    Ok(result)
}

/// Write the fixed payload to the bucket, read it back and decode it.
pub async fn storage_round_trip(
    store: &dyn ObjectStore,
    bucket: Option<&str>,
) -> Result<String, StepExecutionError> {
    let result: Result<String, StepExecutionError> = async {
        let bucket: &str = bucket.ok_or_else(|| {
            StepExecutionError::new(StepName::Storage, format!("{BUCKET_NAME} is not configured"))
        })?;

        tracing::info!(bucket, key = STORAGE_KEY, "Starting I/O-intensive task");

        store
            .put_object(bucket, STORAGE_KEY, STORAGE_PAYLOAD.as_bytes().to_vec())
            .await
            .map_err(|err| StepExecutionError::new(StepName::Storage, err))?;

        let body: Vec<u8> = store
            .get_object(bucket, STORAGE_KEY)
            .await
            .map_err(|err| StepExecutionError::new(StepName::Storage, err))?;

        String::from_utf8(body).map_err(|err| StepExecutionError::new(StepName::Storage, err))
    }
    .await;

    match &result {
        Ok(_) => tracing::info!("Completed I/O-intensive task"),
        Err(err) => tracing::warn!(
            error = %err,
            cause = ?err.cause,
            "Error in I/O-intensive task"
        ),
    }

    result
}

/// One result per queue record, or a single placeholder result when the
/// event carries none.
pub fn process_messages(event: &IncomingEvent) -> Vec<String> {
    let records = event.records();

    let results: Vec<String> = if records.is_empty() {
        tracing::info!("No SQS records in event, processing placeholder message");

        vec![process_message(PLACEHOLDER_MESSAGE)]
    } else {
        records
            .iter()
            .map(|record| process_message(&record.body))
            .collect()
    };

    tracing::info!(processed = results.len(), "Completed message processing");

    results
}

fn process_message(body: &str) -> String {
    tracing::info!(body, "Processing message");

    format!("Processed: {body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::QueueRecord;
    use storage_in_memory::InMemoryObjectStore;
    use test_utils::{event_with_bodies, TEST_BUCKET};

    #[test]
    fn compute_is_sum_of_squares() {
        assert_eq!(0, compute(0).expect("Empty range should sum"));
        assert_eq!(30, compute(5).expect("Small range should sum"));
    }

    #[test]
    fn compute_is_deterministic_for_default_range() {
        let n: u64 = 1_000_000;
        let expected: u64 = (n - 1) * n * (2 * n - 1) / 6;

        assert_eq!(expected, compute(n).expect("Default range should not overflow"));
        assert_eq!(expected, compute(n).expect("Repeated call should match"));
    }

    #[test]
    fn compute_overflow_is_compute_error() {
        let err: StepExecutionError = compute(u64::MAX).expect_err("Range should overflow");

        assert_eq!(StepName::Compute, err.step);
    }

    #[tokio::test]
    async fn storage_round_trip_returns_payload() {
        let store: InMemoryObjectStore = InMemoryObjectStore::default();

        let content: String = storage_round_trip(&store, Some(TEST_BUCKET))
            .await
            .expect("Round trip should succeed");

        assert_eq!(STORAGE_PAYLOAD, content);
        assert_eq!(1, store.object_count());
    }

    #[tokio::test]
    async fn storage_without_bucket_fails() {
        let store: InMemoryObjectStore = InMemoryObjectStore::default();

        let err: StepExecutionError = storage_round_trip(&store, None)
            .await
            .expect_err("Missing bucket should fail");

        assert_eq!(StepName::Storage, err.step);
        assert_eq!(0, store.object_count());
    }

    #[tokio::test]
    async fn storage_write_failure_is_storage_error() {
        let err: StepExecutionError =
            storage_round_trip(&InMemoryObjectStore::failing_puts(), Some(TEST_BUCKET))
                .await
                .expect_err("Write should fail");

        assert_eq!(StepName::Storage, err.step);
        assert!(err.cause.to_string().contains("PutObject"));
    }

    #[tokio::test]
    async fn storage_read_failure_is_storage_error() {
        let err: StepExecutionError =
            storage_round_trip(&InMemoryObjectStore::failing_gets(), Some(TEST_BUCKET))
                .await
                .expect_err("Read should fail");

        assert_eq!(StepName::Storage, err.step);
        assert!(err.cause.to_string().contains("GetObject"));
    }

    #[test]
    fn records_are_processed_in_order() {
        let event: IncomingEvent = event_with_bodies(&["hello", "world", "again"]);

        assert_eq!(
            vec!["Processed: hello", "Processed: world", "Processed: again"],
            process_messages(&event)
        );
    }

    #[test]
    fn missing_records_produce_one_placeholder() {
        assert_eq!(
            vec!["Processed: Test message (no SQS event)"],
            process_messages(&IncomingEvent::default())
        );
    }

    #[test]
    fn empty_records_produce_one_placeholder() {
        let event: IncomingEvent = IncomingEvent::with_records(vec![]);

        assert_eq!(1, process_messages(&event).len());
    }

    #[test]
    fn record_body_is_kept_verbatim() {
        let event: IncomingEvent =
            IncomingEvent::with_records(vec![QueueRecord::from("{\"id\": 1}")]);

        assert_eq!(vec!["Processed: {\"id\": 1}"], process_messages(&event));
    }
}
