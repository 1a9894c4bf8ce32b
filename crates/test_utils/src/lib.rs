use async_trait::async_trait;
use aws_sdk_s3::operation::get_object::GetObjectOutput;
use aws_sdk_s3::operation::put_object::PutObjectOutput;
use aws_sdk_s3::primitives::ByteStream;
use aws_smithy_mocks::{mock, mock_client, Rule, RuleMode};
use model::invocation::InvocationContext;
use model::{IncomingEvent, QueueRecord};
use profiler::{Profile, ProfileReporter, ProfilerError};
use std::sync::Mutex;

/// Test bucket and identity values
pub const TEST_BUCKET: &str = "test-bucket";
pub const TEST_REQUEST_ID: &str = "8476a536-e9f4-11e8-9739-2dfe598c3fcd";
pub const TEST_FUNCTION_ARN: &str = "arn:aws:lambda:us-east-1:123456789012:function:profiled";

/// Create an event carrying one queue record per body
pub fn event_with_bodies(bodies: &[&str]) -> IncomingEvent {
    IncomingEvent::with_records(bodies.iter().map(|&body| QueueRecord::from(body)).collect())
}

pub fn test_invocation_context() -> InvocationContext {
    InvocationContext::new(TEST_REQUEST_ID, TEST_FUNCTION_ARN)
}

/// A mock S3 client which accepts any put and returns `body` for any get
pub fn create_mock_s3_client(body: &'static str) -> aws_sdk_s3::Client {
    let put_object_rule: Rule = mock!(aws_sdk_s3::Client::put_object)
        .match_requests(|_| true)
        .sequence()
        .output(|| PutObjectOutput::builder().build())
        .repeatedly()
        .build();

    let get_object_rule: Rule = mock!(aws_sdk_s3::Client::get_object)
        .match_requests(|_| true)
        .sequence()
        .output(move || {
            GetObjectOutput::builder()
                .body(ByteStream::from_static(body.as_bytes()))
                .build()
        })
        .repeatedly()
        .build();

    mock_client!(
        aws_sdk_s3,
        RuleMode::MatchAny,
        [&put_object_rule, &get_object_rule]
    )
}

/// Reporter which keeps every profile it receives.
#[derive(Default)]
pub struct RecordingReporter {
    profiles: Mutex<Vec<Profile>>,
}

impl RecordingReporter {
    pub fn profiles(&self) -> Vec<Profile> {
        self.profiles
            .lock()
            .expect("Recording reporter lock should not be poisoned")
            .clone()
    }
}

#[async_trait]
impl ProfileReporter for RecordingReporter {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn report(&self, profile: &Profile) -> Result<(), ProfilerError> {
        self.profiles
            .lock()
            .expect("Recording reporter lock should not be poisoned")
            .push(profile.clone());

        Ok(())
    }
}
