use crate::traits::{validate_key, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::RwLock;

/// In-process storage backend.
///
/// For development and tests only: objects disappear on restart and are not visible to
/// other workers.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(
        &self,
        storage_key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<()> {
        validate_key(storage_key)?;
        let size = data.len();
        self.objects.write().await.insert(
            storage_key.to_string(),
            StoredObject {
                data: Bytes::from(data),
                content_type: content_type.to_string(),
            },
        );
        tracing::debug!(key = %storage_key, size_bytes = size, "Object stored in memory");
        Ok(())
    }

    async fn put_stream(
        &self,
        storage_key: &str,
        content_type: &str,
        content_length: Option<u64>,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<()> {
        let mut data = Vec::with_capacity(content_length.unwrap_or(0) as usize);
        reader
            .read_to_end(&mut data)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        self.put(storage_key, content_type, data).await
    }

    async fn get(&self, storage_key: &str) -> StorageResult<StoredObject> {
        self.objects
            .read()
            .await
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.objects.write().await.remove(storage_key);
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.objects.read().await.contains_key(storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_overwrite_keeps_single_object() {
        let storage = MemoryStorage::new();
        storage
            .put("thumbnails/x.png", "image/png", vec![1])
            .await
            .unwrap();
        storage
            .put("thumbnails/x.png", "image/png", vec![2])
            .await
            .unwrap();
        assert_eq!(storage.len().await, 1);
        assert_eq!(
            storage.get("thumbnails/x.png").await.unwrap().data.as_ref(),
            &[2]
        );
    }

    #[tokio::test]
    async fn test_put_stream_and_delete() {
        let storage = MemoryStorage::new();
        let reader = Box::pin(std::io::Cursor::new(vec![7u8; 16]));
        storage
            .put_stream("other/v.mp4", "video/mp4", Some(16), reader)
            .await
            .unwrap();
        assert_eq!(storage.keys().await, vec!["other/v.mp4".to_string()]);

        storage.delete("other/v.mp4").await.unwrap();
        assert!(storage.is_empty().await);
    }
}
