use crate::step::StepName;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub mod env;
pub mod invocation;
pub mod step;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// The raw event handed to the function.
/// Only the `Records` key is read; everything else is ignored.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct IncomingEvent {
    #[serde(rename = "Records", default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<QueueRecord>>,
}

impl IncomingEvent {
    pub fn with_records(records: Vec<QueueRecord>) -> Self {
        IncomingEvent {
            records: Some(records),
        }
    }

    /// Records delivered with the event, empty when the key is absent.
    pub fn records(&self) -> &[QueueRecord] {
        self.records.as_deref().unwrap_or_default()
    }
}

/// A single message delivered by the queue event source.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QueueRecord {
    pub body: String,
}

impl From<&str> for QueueRecord {
    fn from(body: &str) -> Self {
        QueueRecord {
            body: body.to_string(),
        }
    }
}

/// Results of every step keyed by their result name.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WorkflowResult {
    pub cpu_result: u64,
    pub io_result: String,
    pub sqs_results: Vec<String>,
}

/// Response returned to the Lambda runtime.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn ok(result: &WorkflowResult) -> Result<Self, Error> {
        Ok(InvocationResponse {
            status_code: 200,
            body: serde_json::to_string(result)?,
        })
    }
}

/// A step failed. Carries the step and the untouched cause.
#[derive(Debug)]
pub struct StepExecutionError {
    pub step: StepName,
    pub cause: Error,
}

impl StepExecutionError {
    pub fn new(step: StepName, cause: impl Into<Error>) -> Self {
        StepExecutionError {
            step,
            cause: cause.into(),
        }
    }

    /// Messages of the cause and everything beneath it, outermost first.
    pub fn cause_chain(&self) -> Vec<String> {
        let mut chain: Vec<String> = vec![self.cause.to_string()];
        let mut source: Option<&(dyn std::error::Error + 'static)> = self.cause.source();

        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }

        chain
    }
}

impl Display for StepExecutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "step [{}] failed: {}", self.step, self.cause)
    }
}

impl std::error::Error for StepExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_without_records_key_has_no_records() {
        let event: IncomingEvent = serde_json::from_str("{}").expect("Empty event should parse");

        assert_eq!(None, event.records);
        assert!(event.records().is_empty());
    }

    #[test]
    fn event_ignores_unknown_record_fields() {
        let raw: &str = r#"{
            "Records": [
                {"messageId": "1", "body": "hello", "eventSource": "aws:sqs"},
                {"body": "world", "attributes": {"ApproximateReceiveCount": "1"}}
            ],
            "somethingElse": true
        }"#;

        let event: IncomingEvent = serde_json::from_str(raw).expect("Event should parse");
        let bodies: Vec<&str> = event.records().iter().map(|r| r.body.as_str()).collect();

        assert_eq!(vec!["hello", "world"], bodies);
    }

    #[test]
    fn response_body_is_serialised_result() {
        let result: WorkflowResult = WorkflowResult {
            cpu_result: 14,
            io_result: "Hello, World!".to_string(),
            sqs_results: vec!["Processed: a".to_string()],
        };

        let response: InvocationResponse =
            InvocationResponse::ok(&result).expect("Result should serialise");
        let value: serde_json::Value =
            serde_json::to_value(&response).expect("Response should serialise");

        assert_eq!(200, value["statusCode"]);

        let body: WorkflowResult =
            serde_json::from_str(&response.body).expect("Body should be a workflow result");
        assert_eq!(result, body);
    }

    #[test]
    fn step_error_keeps_cause_as_source() {
        let err: StepExecutionError = StepExecutionError::new(StepName::Storage, "bucket gone");

        assert_eq!("step [storage] failed: bucket gone", err.to_string());
        assert_eq!(
            "bucket gone",
            std::error::Error::source(&err)
                .expect("Cause should be the source")
                .to_string()
        );
        assert_eq!(vec!["bucket gone".to_string()], err.cause_chain());
    }
}
