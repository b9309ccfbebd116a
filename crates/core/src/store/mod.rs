//! Content-addressed blob storage boundary
//!
//! The core never talks to a blob backend directly; it goes through the
//! [`ContentStore`] trait, which any adapter (IPFS gateway, object store,
//! test double) can implement. Stores are content-addressed: `put` returns
//! the BLAKE3 hash of the stored bytes, and `get` must return byte-identical
//! data for that hash. Identical envelopes may dedupe to one entry.

mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub use memory::MemoryContentStore;

/// Size of a BLAKE3 content hash in bytes (256 bits)
pub const CONTENT_HASH_SIZE: usize = 32;

/// Errors that can occur against a content store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No blob is stored under the requested hash
    #[error("content not found: {0}")]
    NotFound(ContentHash),
    #[error("store error: {0}")]
    Default(#[from] anyhow::Error),
}

/// BLAKE3-256 hash identifying a stored envelope
///
/// Serialized as a hex string, which is also how ledger adapters are
/// expected to record it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; CONTENT_HASH_SIZE]);

impl ContentHash {
    /// Hash a byte slice
    pub fn compute(bytes: &[u8]) -> Self {
        ContentHash(*blake3::hash(bytes).as_bytes())
    }

    /// Parse a content hash from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, StoreError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0; CONTENT_HASH_SIZE];
        hex::decode_to_slice(hex, &mut buff)
            .map_err(|_| anyhow::anyhow!("content hash hex decode error"))?;
        Ok(ContentHash(buff))
    }

    /// Convert content hash to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get a reference to the raw hash bytes
    pub fn as_bytes(&self) -> &[u8; CONTENT_HASH_SIZE] {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        ContentHash::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// Content-addressed blob store collaborator
///
/// Implementations own their transport, timeouts, and retries; the core
/// treats every failure other than `NotFound` as terminal for the current
/// operation and never retries internally.
#[async_trait]
pub trait ContentStore: Send + Sync + std::fmt::Debug + Clone + 'static {
    /// Store bytes and return their content hash
    async fn put(&self, bytes: Bytes) -> Result<ContentHash, StoreError>;

    /// Fetch the bytes stored under a hash
    ///
    /// Must return data byte-identical to what `put` stored.
    async fn get(&self, hash: &ContentHash) -> Result<Bytes, StoreError>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_content_hash_hex_roundtrip() {
        let hash = ContentHash::compute(b"some envelope bytes");
        let hex = hash.to_hex();
        let recovered = ContentHash::from_hex(&hex).unwrap();
        assert_eq!(hash, recovered);

        let prefixed = format!("0x{}", hex);
        assert_eq!(hash, ContentHash::from_hex(&prefixed).unwrap());
    }

    #[test]
    fn test_content_hash_is_deterministic() {
        assert_eq!(
            ContentHash::compute(b"same bytes"),
            ContentHash::compute(b"same bytes")
        );
        assert_ne!(
            ContentHash::compute(b"some bytes"),
            ContentHash::compute(b"other bytes")
        );
    }

    #[test]
    fn test_content_hash_serde() {
        let hash = ContentHash::compute(b"serialized");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));

        let decoded: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, decoded);
    }
}
