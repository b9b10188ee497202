use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::{ObjectStorage, StorageError, expiry_timestamp, validate_key};

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// In-memory object storage for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryObjectStorage {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .ok()
            .and_then(|objects| objects.get(key).map(|o| o.content_type.clone()))
    }
}

fn poisoned() -> StorageError {
    StorageError::Backend("in-memory storage lock poisoned".to_string())
}

#[async_trait::async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut objects = self.objects.write().map_err(|_| poisoned())?;
        objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        validate_key(key)?;
        Ok(format!("memory://{key}?expires={}", expiry_timestamp(ttl)))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(key)?;
        let objects = self.objects.read().map_err(|_| poisoned())?;
        objects
            .get(key)
            .map(|o| o.bytes.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_get_returns_bytes() {
        let storage = InMemoryObjectStorage::new();
        storage
            .upload("images/a.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();

        assert_eq!(storage.get("images/a.png").await.unwrap(), vec![1, 2, 3]);
        assert_eq!(storage.content_type("images/a.png").as_deref(), Some("image/png"));
        assert_eq!(storage.keys(), vec!["images/a.png".to_string()]);
    }

    #[tokio::test]
    async fn missing_objects_are_not_found() {
        let storage = InMemoryObjectStorage::new();
        let err = storage.get("tasks/missing.json").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn presigned_urls_carry_expiry() {
        let storage = InMemoryObjectStorage::new();
        let url = storage
            .presign("images/a.png", Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(url.starts_with("memory://images/a.png?expires="));
    }
}
