use crate::{LocalStorage, MemoryStorage, S3Storage, Storage, StorageError, StorageResult};
use komuchi_core::{Config, StorageBackend};
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend() {
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let storage = S3Storage::new(
                bucket,
                config.s3_region().to_string(),
                config.s3_endpoint().map(String::from),
                config.s3_access_key_id().map(String::from),
                config.s3_secret_access_key().map(String::from),
            )?;
            Ok(Arc::new(storage))
        }
        StorageBackend::Local => {
            let storage = LocalStorage::new(config.local_storage_path()).await?;
            Ok(Arc::new(storage))
        }
        StorageBackend::Memory => {
            let bucket = config.s3_bucket().unwrap_or("memory");
            Ok(Arc::new(MemoryStorage::new(bucket)))
        }
    }
}
