use async_trait::async_trait;

/// Object storage for uploaded media.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key` and return the public URL of the object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
    -> Result<String, StorageError>;

    /// Delete the object behind a URL previously returned by [`ObjectStorage::put`].
    async fn delete(&self, url: &str) -> Result<(), StorageError>;

    /// The object key behind a URL this store handed out.
    ///
    /// `None` for URLs of other stores and for keys that fail validation.
    fn key_of(&self, url: &str) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("URL does not belong to this store: {0}")]
    ForeignUrl(String),

    #[error("Storage I/O failed: {0}")]
    Io(String),

    #[error("Storage backend rejected the request: {0}")]
    Backend(String),
}
