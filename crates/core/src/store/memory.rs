use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use super::{ContentHash, ContentStore, StoreError};

/// In-memory content store backed by a HashMap
///
/// Used as a test double and for local, non-networked operation. Entries are
/// keyed by the BLAKE3 hash of their bytes, so storing the same bytes twice
/// dedupes to a single entry.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    inner: Arc<RwLock<HashMap<ContentHash, Bytes>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blobs currently stored
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the store holds no blobs
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, bytes: Bytes) -> Result<ContentHash, StoreError> {
        let hash = ContentHash::compute(&bytes);
        self.inner.write().insert(hash, bytes);
        Ok(hash)
    }

    async fn get(&self, hash: &ContentHash) -> Result<Bytes, StoreError> {
        self.inner
            .read()
            .get(hash)
            .cloned()
            .ok_or(StoreError::NotFound(*hash))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryContentStore::new();
        let bytes = Bytes::from_static(b"envelope bytes");

        let hash = store.put(bytes.clone()).await.unwrap();
        assert_eq!(hash, ContentHash::compute(&bytes));

        let fetched = store.get(&hash).await.unwrap();
        assert_eq!(fetched, bytes);
    }

    #[tokio::test]
    async fn test_identical_bytes_dedupe() {
        let store = MemoryContentStore::new();
        let bytes = Bytes::from_static(b"same bytes");

        let first = store.put(bytes.clone()).await.unwrap();
        let second = store.put(bytes).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryContentStore::new();
        let hash = ContentHash::compute(b"never stored");

        let result = store.get(&hash).await;
        assert!(matches!(result, Err(StoreError::NotFound(h)) if h == hash));
    }
}
