//! Object storage adapters for uploaded media.

mod local;
mod memory;

#[cfg(feature = "object-storage")]
mod http;

pub use local::{LocalObjectStorage, LocalStorageConfig};
pub use memory::MemoryObjectStorage;

#[cfg(feature = "object-storage")]
pub use http::{HttpObjectStorage, HttpStorageConfig};

use kindred_core::ports::StorageError;

/// Accept relative keys made of `[A-Za-z0-9._-]` segments separated by `/`.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        });

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
