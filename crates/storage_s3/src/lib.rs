use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::{GetObjectError, GetObjectOutput};
use aws_sdk_s3::primitives::ByteStream;
use storage::StorageErrorReason::{BackendFailure, BadContent, MissingObject};
use storage::StorageOperation::{GetObject, PutObject};
use storage::{ObjectStore, StorageError};

/// Object store backed by S3.
#[derive(Clone)]
pub struct S3ObjectStore {
    s3_client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(s3_client: aws_sdk_s3::Client) -> Self {
        S3ObjectStore { s3_client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<(), StorageError> {
        self.s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| StorageError::new(bucket, key, PutObject, BackendFailure(err.into())))?;

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let output: GetObjectOutput = self
            .s3_client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StorageError::new(bucket, key, GetObject, get_failure_reason(err)))?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|err| StorageError::new(bucket, key, GetObject, BadContent(err.to_string())))?;

        Ok(body.into_bytes().to_vec())
    }
}

fn get_failure_reason(err: SdkError<GetObjectError, HttpResponse>) -> storage::StorageErrorReason {
    let missing: bool = err
        .as_service_error()
        .is_some_and(|service_err| service_err.is_no_such_key());

    if missing {
        MissingObject
    } else {
        BackendFailure(err.into())
    }
}
