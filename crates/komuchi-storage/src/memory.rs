use crate::traits::{validate_key, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use komuchi_core::StorageBackend;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory storage implementation
///
/// Holds objects as `(bytes, content_type)` pairs in a shared map. Backs the
/// integration test suite and local development without any external
/// dependency. Presigned URLs are synthesized with a `memory://` scheme so
/// the presigned upload flow stays exercisable end to end; tests resolve the
/// key out of the URL and write through [`Storage::upload`] instead of HTTP.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    bucket: String,
    objects: Arc<RwLock<HashMap<String, (Bytes, String)>>>,
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        MemoryStorage {
            bucket: bucket.into(),
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored objects. Test-suite convenience.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Drop every stored object.
    pub async fn clear(&self) {
        self.objects.write().await.clear();
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.objects
            .write()
            .await
            .insert(key.to_string(), (Bytes::from(data), content_type.to_string()));
        Ok(())
    }

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        validate_key(key)?;
        let objects = self.objects.read().await;
        let (bytes, _) = objects
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn content_length(&self, key: &str) -> StorageResult<u64> {
        validate_key(key)?;
        let objects = self.objects.read().await;
        let (bytes, _) = objects
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(bytes.len() as u64)
    }

    async fn presigned_put_url(
        &self,
        key: &str,
        _content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_key(key)?;
        Ok(format!(
            "memory://{}/{}?expires={}",
            self.bucket,
            key,
            expires_in.as_secs()
        ))
    }

    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        validate_key(key)?;
        if !self.objects.read().await.contains_key(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(format!(
            "memory://{}/{}?expires={}",
            self.bucket,
            key,
            expires_in.as_secs()
        ))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_serves_objects() {
        let storage = MemoryStorage::new("test-bucket");
        storage
            .upload("recordings/u/r.mp3", b"abc".to_vec(), "audio/mpeg")
            .await
            .unwrap();

        assert!(storage.exists("recordings/u/r.mp3").await.unwrap());
        assert_eq!(storage.content_length("recordings/u/r.mp3").await.unwrap(), 3);
        assert_eq!(storage.download("recordings/u/r.mp3").await.unwrap(), b"abc");
        assert_eq!(storage.len().await, 1);

        storage.delete("recordings/u/r.mp3").await.unwrap();
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn presigned_urls_encode_bucket_key_and_expiry() {
        let storage = MemoryStorage::new("test-bucket");
        let url = storage
            .presigned_put_url("recordings/u/r.mp3", "audio/mpeg", Duration::from_secs(900))
            .await
            .unwrap();
        assert_eq!(url, "memory://test-bucket/recordings/u/r.mp3?expires=900");
    }

    #[tokio::test]
    async fn presigned_get_requires_existing_object() {
        let storage = MemoryStorage::new("test-bucket");
        let err = storage
            .presigned_get_url("recordings/u/missing.mp3", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn clones_share_the_same_objects() {
        let storage = MemoryStorage::new("test-bucket");
        let other = storage.clone();
        other
            .upload("recordings/u/r.mp3", b"x".to_vec(), "audio/mpeg")
            .await
            .unwrap();
        assert!(storage.exists("recordings/u/r.mp3").await.unwrap());
    }
}
