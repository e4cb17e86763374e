//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use thispdf_core::AppError;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("URL signing failed: {0}")]
    SigningFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => AppError::NotFound("File not found".to_string()),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// User metadata recorded with an object (e.g. `original_filename`).
pub type ObjectAttributes = BTreeMap<String, String>;

/// Storage abstraction trait
///
/// Keys are full object paths inside the configured bucket; see [`crate::keys`].
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` at `key`, replacing any existing object.
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        attributes: &ObjectAttributes,
    ) -> StorageResult<()>;

    /// Delete the object at `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Produce a time-limited GET URL for `key`.
    ///
    /// Returns `NotFound` when the object does not exist, and `SigningFailed`
    /// when the object exists but no URL could be produced. URLs are signed
    /// against the public host, never the internal write endpoint.
    async fn sign_url(&self, key: &str, ttl: Duration) -> StorageResult<String>;

    /// Unsigned URL for `key` on the public host.
    fn public_url(&self, key: &str) -> String;

    /// Bucket (or namespace) name
    fn bucket(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
