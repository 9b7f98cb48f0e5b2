//! In-Memory Storage Implementation

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{trim_path, StorageProvider},
};
use bytes::Bytes;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local object store
///
/// Contents live for the lifetime of the value. A `BTreeMap` keeps listings
/// sorted without extra work.
#[derive(Default)]
pub struct InMemoryStorage {
    objects: RwLock<BTreeMap<String, Bytes>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl StorageProvider for InMemoryStorage {
    fn mode(&self) -> &'static str {
        "MEMORY"
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let objects = self.objects.read().await;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(path, _)| path.starts_with(prefix))
            .map(|(path, _)| path.clone())
            .collect())
    }

    async fn read(&self, path: &str) -> Result<Bytes> {
        self.objects
            .read()
            .await
            .get(trim_path(path))
            .cloned()
            .ok_or_else(|| BridgeError::NotFound(path.to_string()))
    }

    async fn write(&self, path: &str, data: Bytes) -> Result<()> {
        let key = trim_path(path);
        if key.is_empty() {
            return Err(BridgeError::OperationFailed(
                "Cannot write to an empty path".to_string(),
            ));
        }
        debug!(path = %key, size = data.len(), "Stored object in memory");
        self.objects.write().await.insert(key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.objects.write().await.remove(trim_path(path));
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.objects.read().await.contains_key(trim_path(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_delete() {
        let storage = InMemoryStorage::new();
        storage.write("/a/b.png", Bytes::from_static(b"png")).await.unwrap();

        assert_eq!(storage.read("a/b.png").await.unwrap(), Bytes::from_static(b"png"));
        assert!(storage.exists("a/b.png").await.unwrap());

        storage.delete("a/b.png").await.unwrap();
        storage.delete("a/b.png").await.unwrap();
        assert!(storage.read("a/b.png").await.unwrap_err().is_not_found());
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_by_prefix_is_sorted() {
        let storage = InMemoryStorage::new();
        for path in ["out/z.jpg", "in/b.jpg", "in/a.jpg", "index.html"] {
            storage.write(path, Bytes::new()).await.unwrap();
        }

        assert_eq!(storage.list("in/").await.unwrap(), vec!["in/a.jpg", "in/b.jpg"]);
        assert_eq!(storage.list("in").await.unwrap().len(), 3);
        assert_eq!(storage.list("").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_delete_prefix_uses_default() {
        let storage = InMemoryStorage::new();
        storage.write("out/a/1.jpg", Bytes::new()).await.unwrap();
        storage.write("out/b/2.jpg", Bytes::new()).await.unwrap();
        storage.write("outside.jpg", Bytes::new()).await.unwrap();

        let deleted = storage.delete_prefix("out/").await.unwrap();
        assert_eq!(deleted, vec!["out/a/1.jpg", "out/b/2.jpg"]);
        assert_eq!(storage.len().await, 1);
    }
}
