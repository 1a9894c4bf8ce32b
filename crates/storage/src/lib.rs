use ::model::Error;
use async_trait::async_trait;
use std::fmt::{Display, Formatter};

/// Store objects by bucket and key.
/// Implementations decide how buckets map onto the backing service.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>)
    -> Result<(), StorageError>;
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;
}

/// Errors arising from reading or writing objects.
#[derive(Debug)]
pub struct StorageError {
    pub bucket: String,
    pub key: String,

    pub operation: StorageOperation,
    pub reason: StorageErrorReason,
}

#[derive(Debug)]
pub enum StorageErrorReason {
    // The object wasn't found
    MissingObject,
    // The object body couldn't be read
    BadContent(String),
    // An error from the underlying store
    BackendFailure(Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOperation {
    PutObject,
    GetObject,
}

impl StorageError {
    pub fn new(
        bucket: &str,
        key: &str,
        operation: StorageOperation,
        reason: StorageErrorReason,
    ) -> Self {
        StorageError {
            bucket: bucket.to_string(),
            key: key.to_string(),
            operation,
            reason,
        }
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let reason: String = match &self.reason {
            StorageErrorReason::MissingObject => "object not found".to_string(),
            StorageErrorReason::BadContent(detail) => format!("bad content: {detail}"),
            StorageErrorReason::BackendFailure(err) => format!("backend failure: {err}"),
        };

        write!(
            f,
            "{:?} s3://{}/{} failed, {}",
            self.operation, self.bucket, self.key, reason
        )
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.reason {
            StorageErrorReason::BackendFailure(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
