use async_trait::async_trait;
use storage::StorageErrorReason::{BackendFailure, MissingObject};
use storage::StorageOperation::{GetObject, PutObject};
use storage::{ObjectStore, StorageError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type Objects = HashMap<(String, String), Vec<u8>>;

/// Object store held in memory, for local runs and tests.
/// Puts and gets can be made to fail to simulate an unavailable backend.
#[derive(Default, Clone)]
pub struct InMemoryObjectStore {
    objects: Arc<Mutex<Objects>>,
    fail_puts: Arc<AtomicBool>,
    fail_gets: Arc<AtomicBool>,
}

impl InMemoryObjectStore {
    pub fn failing_puts() -> Self {
        let store: InMemoryObjectStore = InMemoryObjectStore::default();
        store.fail_puts.store(true, Ordering::SeqCst);
        store
    }

    pub fn failing_gets() -> Self {
        let store: InMemoryObjectStore = InMemoryObjectStore::default();
        store.fail_gets.store(true, Ordering::SeqCst);
        store
    }

    pub fn object_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Objects> {
        // A poisoned map is still consistent, every write is a single insert
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<(), StorageError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::new(
                bucket,
                key,
                PutObject,
                BackendFailure("simulated put failure".into()),
            ));
        }

        self.lock()
            .insert((bucket.to_string(), key.to_string()), body);

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StorageError::new(
                bucket,
                key,
                GetObject,
                BackendFailure("simulated get failure".into()),
            ));
        }

        self.lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::new(bucket, key, GetObject, MissingObject))
    }
}
