//! Object storage over a plain HTTP PUT/DELETE API (S3-compatible gateways, R2 workers, MinIO).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};

use kindred_core::ports::{ObjectStorage, StorageError};

use super::validate_key;

#[derive(Debug, Clone)]
pub struct HttpStorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub api_key: Option<String>,
    /// Base of the URLs handed back to clients.
    pub public_base_url: String,
}

impl HttpStorageConfig {
    /// Read storage settings; `None` when `STORAGE_ENDPOINT` is unset or blank.
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("STORAGE_ENDPOINT").ok()?;
        let endpoint = endpoint.trim().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return None;
        }

        let bucket =
            std::env::var("STORAGE_BUCKET").unwrap_or_else(|_| "kindred-media".to_string());
        let public_base_url = std::env::var("STORAGE_PUBLIC_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("{endpoint}/{bucket}"));

        Some(Self {
            endpoint,
            bucket,
            api_key: std::env::var("STORAGE_API_KEY").ok(),
            public_base_url,
        })
    }
}

pub struct HttpObjectStorage {
    client: Client,
    config: HttpStorageConfig,
}

impl HttpObjectStorage {
    pub fn new(config: HttpStorageConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| StorageError::Backend(format!("Failed to create HTTP client: {e}")))?;

        tracing::info!(
            endpoint = %config.endpoint,
            bucket = %config.bucket,
            "Object storage configured"
        );
        Ok(Self { client, config })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{key}", self.config.endpoint, self.config.bucket)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_key(key)?;

        let response = self
            .authorized(self.client.put(self.object_url(key)))
            .header(header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::Backend(format!(
                "PUT {key} returned {}",
                response.status()
            )));
        }

        tracing::debug!(key, "Stored object");
        Ok(format!("{}/{key}", self.config.public_base_url))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let key = self
            .key_of(url)
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;

        let response = self
            .authorized(self.client.delete(self.object_url(&key)))
            .send()
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            status => Err(StorageError::Backend(format!("DELETE {key} returned {status}"))),
        }
    }

    fn key_of(&self, url: &str) -> Option<String> {
        let key = url
            .strip_prefix(self.config.public_base_url.as_str())?
            .strip_prefix('/')?;
        validate_key(key).ok().map(|()| key.to_string())
    }
}
