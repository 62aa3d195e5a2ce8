//! Filesystem-backed object storage.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use kindred_core::ports::{ObjectStorage, StorageError};

use super::validate_key;

#[derive(Debug, Clone)]
pub struct LocalStorageConfig {
    /// Directory objects are written under.
    pub root: PathBuf,
    /// URL path prefix the files are served from.
    pub public_prefix: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./uploads"),
            public_prefix: "/uploads".to_string(),
        }
    }
}

impl LocalStorageConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            root: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.root),
            public_prefix: std::env::var("UPLOAD_PUBLIC_PREFIX")
                .map(|p| p.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_prefix),
        }
    }
}

/// Writes objects below a root directory and hands out URLs under a public prefix.
pub struct LocalObjectStorage {
    config: LocalStorageConfig,
}

impl LocalObjectStorage {
    pub fn new(config: LocalStorageConfig) -> Self {
        Self { config }
    }

    pub fn public_prefix(&self) -> &str {
        &self.config.public_prefix
    }

    /// Filesystem path for `key`, rejecting anything that could escape the root.
    pub fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.config.root.join(key))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        tracing::debug!(key, "Stored object on local disk");

        Ok(format!("{}/{key}", self.config.public_prefix))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let key = self
            .key_of(url)
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
        let path = self.resolve(&key)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    fn key_of(&self, url: &str) -> Option<String> {
        let key = url
            .strip_prefix(self.config.public_prefix.as_str())?
            .strip_prefix('/')?;
        validate_key(key).ok().map(|()| key.to_string())
    }
}
