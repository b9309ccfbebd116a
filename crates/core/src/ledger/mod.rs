//! Access-control ledger boundary
//!
//! The ledger is the group's source of truth for two long-lived mappings:
//!
//! - **Recipient directory**: member address -> registered [`PublicKey`].
//!   An address must register a key before it can be named as a recipient;
//!   owners may re-register (overwrite) their key at will.
//! - **File records**: per-group, append-only lists of [`FileRecord`]s,
//!   addressed by their index in the group's list.
//!
//! The core reads and writes these only through the [`AccessLedger`] trait;
//! a chain-backed adapter, a database, or [`MemoryAccessLedger`] can stand
//! behind it. Records are immutable once registered.

mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::crypto::{PublicKey, WrappedKey};
use crate::store::ContentHash;

pub use memory::MemoryAccessLedger;

/// Errors that can occur against the access ledger
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// No record exists at the requested index in the group
    #[error("file {1} not found in group {0}")]
    FileNotFound(GroupId, u64),
    /// Recipient and wrapped key lists must pair positionally
    #[error("recipient list and wrapped key list differ in length: {0} != {1}")]
    RecordMismatch(usize, usize),
    #[error("ledger error: {0}")]
    Default(#[from] anyhow::Error),
}

/// A member's wallet address
///
/// Addresses are hex strings in the wallet's format and compare
/// case-insensitively; the constructor normalizes to lowercase so that
/// positional lookups in a [`FileRecord`] are stable regardless of how the
/// caller cased the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl AsRef<str>) -> Self {
        Address(address.as_ref().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Address {
    fn from(address: &str) -> Self {
        Address::new(address)
    }
}

impl From<String> for Address {
    fn from(address: String) -> Self {
        Address::new(address)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a sharing group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(name: impl Into<String>) -> Self {
        GroupId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GroupId {
    fn from(name: &str) -> Self {
        GroupId(name.to_string())
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger entry describing one shared file
///
/// Pairs the content hash of the stored envelope with the ordered recipient
/// list and, positionally, one [`WrappedKey`] per recipient: `wrapped_keys[i]`
/// is decryptable only by the private key behind `recipients[i]`'s registered
/// public key. Records are created once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    file_name: String,
    content_hash: ContentHash,
    recipients: Vec<Address>,
    wrapped_keys: Vec<WrappedKey>,
}

impl FileRecord {
    /// Build a record, enforcing the positional pairing invariant
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::RecordMismatch`] if the recipient and wrapped
    /// key lists differ in length.
    pub fn new(
        file_name: String,
        content_hash: ContentHash,
        recipients: Vec<Address>,
        wrapped_keys: Vec<WrappedKey>,
    ) -> Result<Self, LedgerError> {
        if recipients.len() != wrapped_keys.len() {
            return Err(LedgerError::RecordMismatch(
                recipients.len(),
                wrapped_keys.len(),
            ));
        }
        Ok(Self {
            file_name,
            content_hash,
            recipients,
            wrapped_keys,
        })
    }

    /// The file name as given at upload (content type is a caller concern)
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Hash of the stored envelope bytes
    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    /// The ordered recipient addresses
    pub fn recipients(&self) -> &[Address] {
        &self.recipients
    }

    /// The wrapped keys, positionally paired with [`recipients`](Self::recipients)
    pub fn wrapped_keys(&self) -> &[WrappedKey] {
        &self.wrapped_keys
    }

    /// Position of an address within the recipient list, if present
    pub fn position_of(&self, address: &Address) -> Option<usize> {
        self.recipients.iter().position(|a| a == address)
    }

    /// The wrapped key sealed for an address, if it is a recipient
    pub fn wrapped_key_for(&self, address: &Address) -> Option<&WrappedKey> {
        self.position_of(address).map(|i| &self.wrapped_keys[i])
    }
}

/// Access-control ledger collaborator
///
/// All calls are assumed durable once acknowledged. Registration is the last
/// step of an upload, so a caller cancelling mid-upload leaves no ledger
/// write behind.
#[async_trait]
pub trait AccessLedger: Send + Sync + std::fmt::Debug + Clone + 'static {
    /// Append a file record to a group's list, returning its index
    async fn register_file(
        &self,
        group: &GroupId,
        record: FileRecord,
    ) -> Result<u64, LedgerError>;

    /// Fetch the record at an index in a group's list
    async fn get_file(&self, group: &GroupId, index: u64) -> Result<FileRecord, LedgerError>;

    /// Fetch all records in a group, in registration order
    ///
    /// A record's position in the returned list is its index, so recipients
    /// can discover which `file_index` to download. A group with no files
    /// yields an empty list, not an error.
    async fn list_files(&self, group: &GroupId) -> Result<Vec<FileRecord>, LedgerError>;

    /// Look up an address in the recipient directory
    ///
    /// Returns `Ok(None)` when the address never registered a key; resolution
    /// treats that as a hard error, not this layer.
    async fn get_public_key(&self, address: &Address) -> Result<Option<PublicKey>, LedgerError>;

    /// Register (or overwrite) the public key for an address
    async fn set_public_key(&self, address: &Address, key: PublicKey) -> Result<(), LedgerError>;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::WRAPPED_KEY_SIZE;

    #[test]
    fn test_address_normalization() {
        let upper = Address::new("0xAbCdEf");
        let lower = Address::new("0xabcdef");
        assert_eq!(upper, lower);
        assert_eq!(upper.as_str(), "0xabcdef");
    }

    #[test]
    fn test_record_rejects_mismatched_lists() {
        let result = FileRecord::new(
            "report.pdf".to_string(),
            ContentHash::compute(b"envelope"),
            vec![Address::new("0xaa"), Address::new("0xbb")],
            vec![WrappedKey::default()],
        );
        assert!(matches!(result, Err(LedgerError::RecordMismatch(2, 1))));
    }

    #[test]
    fn test_record_positional_lookup() {
        let alice = Address::new("0xAA");
        let bob = Address::new("0xBB");
        let keys = vec![
            WrappedKey::from([1u8; WRAPPED_KEY_SIZE]),
            WrappedKey::from([2u8; WRAPPED_KEY_SIZE]),
        ];
        let record = FileRecord::new(
            "report.pdf".to_string(),
            ContentHash::compute(b"envelope"),
            vec![alice.clone(), bob.clone()],
            keys.clone(),
        )
        .unwrap();

        assert_eq!(record.position_of(&alice), Some(0));
        assert_eq!(record.position_of(&bob), Some(1));
        assert_eq!(record.wrapped_key_for(&bob), Some(&keys[1]));

        // case-insensitive match through normalization
        assert_eq!(record.position_of(&Address::new("0xaa")), Some(0));

        let carol = Address::new("0xcc");
        assert_eq!(record.position_of(&carol), None);
        assert_eq!(record.wrapped_key_for(&carol), None);
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let record = FileRecord::new(
            "notes.txt".to_string(),
            ContentHash::compute(b"envelope"),
            vec![Address::new("0xaa")],
            vec![WrappedKey::from([7u8; WRAPPED_KEY_SIZE])],
        )
        .unwrap();

        let encoded = serde_ipld_dagcbor::to_vec(&record).unwrap();
        let decoded: FileRecord = serde_ipld_dagcbor::from_slice(&encoded).unwrap();
        assert_eq!(record, decoded);
    }
}
