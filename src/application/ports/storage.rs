//! Key-value persistence port

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(String),

    #[error("Stored value for '{key}' is corrupt: {message}")]
    Corrupt { key: String, message: String },

    #[error("Failed to serialize value: {0}")]
    Serialize(String),
}

/// Port for a document store holding JSON values under string keys
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Replace the value stored under `key`.
    /// Readers see either the old or the new value, never a partial write.
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
}
