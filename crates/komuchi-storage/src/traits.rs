//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use komuchi_core::StorageBackend;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Presigned URLs not supported by the {0} backend")]
    PresignedUrlNotSupported(StorageBackend),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem, in-memory) must implement this
/// trait so services and the worker can move recording audio around without
/// coupling to a specific backend.
///
/// **Key format:** keys are caller-assigned, e.g.
/// `recordings/{user_id}/{recording_id}.{ext}`. Backends must reject keys
/// that escape their root (path traversal) with [`StorageError::InvalidKey`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload an object to the given key, replacing any existing object.
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<()>;

    /// Download an object by key.
    async fn download(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Delete an object by key. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get the size in bytes of an object, if it exists.
    async fn content_length(&self, key: &str) -> StorageResult<u64>;

    /// Generate a presigned PUT URL for direct client uploads.
    ///
    /// Backends without presigning support return
    /// [`StorageError::PresignedUrlNotSupported`].
    async fn presigned_put_url(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Generate a presigned GET URL for temporary direct access.
    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Reject keys that are empty, absolute, or contain traversal components.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("empty key".to_string()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    if key.split('/').any(|part| part == ".." || part == ".") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
