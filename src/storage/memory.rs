// In-process object store

use super::{ObjectStore, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::Mutex;

/// A stored object.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// Keeps uploads in memory. Paths listed in `failing` reject their uploads.
#[derive(Debug, Default)]
pub struct MemoryStore {
    base_url: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    failing: HashSet<String>,
}

impl MemoryStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn failing_on(mut self, path: impl Into<String>) -> Self {
        self.failing.insert(path.into());
        self
    }

    pub async fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects.lock().await.get(path).cloned()
    }

    pub async fn paths(&self) -> Vec<String> {
        self.objects.lock().await.keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, path: &str, data: Bytes, content_type: &str) -> Result<(), StorageError> {
        if self.failing.contains(path) {
            return Err(StorageError::Api {
                status: 500,
                message: format!("rejected upload of {}", path),
            });
        }
        self.objects.lock().await.insert(
            path.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}
