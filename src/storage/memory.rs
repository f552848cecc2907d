use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::OptimizerError;
use crate::storage::ObjectStore;

/// In-process bucket, interchangeable with [`S3Store`](crate::storage::S3Store).
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, payload: impl Into<Bytes>) {
        self.objects().insert(key.into(), payload.into());
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.objects().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn objects(&self) -> MutexGuard<'_, HashMap<String, Bytes>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn download(&self, key: &str) -> Result<Bytes, OptimizerError> {
        self.get(key).ok_or_else(|| OptimizerError::StorageRead {
            key: key.to_owned(),
            source: "no such key".into(),
        })
    }

    async fn upload(&self, key: &str, payload: Bytes) -> Result<(), OptimizerError> {
        self.insert(key, payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_overwrites_existing_object() {
        let store = MemoryStore::new();
        store
            .upload("a.jpg", Bytes::from_static(b"old"))
            .await
            .unwrap();
        store
            .upload("a.jpg", Bytes::from_static(b"new"))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.download("a.jpg").await.unwrap(), &b"new"[..]);
    }

    #[tokio::test]
    async fn missing_object_is_a_read_error() {
        let store = MemoryStore::new();
        let err = store.download("nope.jpg").await.unwrap_err();

        match err {
            OptimizerError::StorageRead { key, .. } => assert_eq!(key, "nope.jpg"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
