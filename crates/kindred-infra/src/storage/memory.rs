//! In-memory object storage - test double and no-disk fallback.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use kindred_core::ports::{ObjectStorage, StorageError};

use super::validate_key;

const BASE_URL: &str = "memory://objects";

#[derive(Debug, Default)]
pub struct MemoryObjectStorage {
    objects: RwLock<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes and content type stored under `key`.
    pub async fn get(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects.read().await.get(key).cloned()
    }

    /// Whether a URL returned by `put` still points at a stored object.
    pub async fn contains_url(&self, url: &str) -> bool {
        match url.strip_prefix(BASE_URL).and_then(|k| k.strip_prefix('/')) {
            Some(key) => self.objects.read().await.contains_key(key),
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_key(key)?;
        self.objects
            .write()
            .await
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(format!("{BASE_URL}/{key}"))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let key = self
            .key_of(url)
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
        self.objects.write().await.remove(&key);
        Ok(())
    }

    fn key_of(&self, url: &str) -> Option<String> {
        let key = url.strip_prefix(BASE_URL)?.strip_prefix('/')?;
        validate_key(key).ok().map(|()| key.to_string())
    }
}
