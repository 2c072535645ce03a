//! In-memory object store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;

use crate::{ObjectBody, ObjectInfo, ObjectStore, StorageError};

/// Chunk size used when streaming stored objects.
const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Bytes>>,
    base_url: String,
}

impl MemoryStore {
    /// `base_url` prefixes the URLs returned by [`ObjectStore::presign_get`].
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            objects: RwLock::default(),
            base_url: base_url.into(),
        }
    }

    pub fn insert(&self, key: impl Into<String>, data: impl Into<Bytes>) {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), data.into());
    }

    fn lookup(&self, key: &str) -> Result<Bytes, StorageError> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn head_object(&self, key: &str) -> Result<ObjectInfo, StorageError> {
        let data = self.lookup(key)?;
        Ok(ObjectInfo {
            content_length: Some(data.len() as u64),
            content_language: None,
        })
    }

    async fn get_object(&self, key: &str) -> Result<ObjectBody, StorageError> {
        let data = self.lookup(key)?;
        let content_length = Some(data.len() as u64);
        let chunks: Vec<Result<Bytes, std::io::Error>> = (0..data.len())
            .step_by(CHUNK_SIZE)
            .map(|start| Ok(data.slice(start..(start + CHUNK_SIZE).min(data.len()))))
            .collect();

        Ok(ObjectBody {
            content_length,
            stream: futures_util::stream::iter(chunks).boxed(),
        })
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        self.lookup(key)?;
        Ok(format!(
            "{}/{key}?expires={}",
            self.base_url.trim_end_matches('/'),
            ttl.as_secs()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn head_and_get() {
        let store = MemoryStore::new("http://minio.local/bucket");
        let data = vec![7u8; CHUNK_SIZE * 2 + 10];
        store.insert("a/b/1-c", data.clone());

        let info = store.head_object("a/b/1-c").await.unwrap();
        assert_eq!(info.content_length, Some(data.len() as u64));

        let body = store.get_object("a/b/1-c").await.unwrap();
        assert_eq!(body.content_length, Some(data.len() as u64));
        let chunks: Vec<Bytes> = body
            .stream
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), data);
    }

    #[tokio::test]
    async fn empty_object_has_no_chunks() {
        let store = MemoryStore::default();
        store.insert("empty", Bytes::new());
        let body = store.get_object("empty").await.unwrap();
        assert_eq!(body.content_length, Some(0));
        assert_eq!(body.stream.count().await, 0);
    }

    #[tokio::test]
    async fn missing_keys() {
        let store = MemoryStore::default();
        assert!(store.head_object("nope").await.unwrap_err().is_not_found());
        assert!(store.get_object("nope").await.unwrap_err().is_not_found());
        assert!(store
            .presign_get("nope", Duration::from_secs(60))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn presign_embeds_key_and_ttl() {
        let store = MemoryStore::new("http://minio.local/bucket/");
        store.insert("j/t/n/1-f", "x");
        let url = store
            .presign_get("j/t/n/1-f", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(url, "http://minio.local/bucket/j/t/n/1-f?expires=60");
    }
}
