use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::crypto::PublicKey;

use super::{AccessLedger, Address, FileRecord, GroupId, LedgerError};

/// In-memory access ledger using HashMaps
///
/// Used as a test double and for local, non-networked operation. File lists
/// are append-only per group; directory entries may be overwritten by
/// re-registration.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccessLedger {
    inner: Arc<RwLock<MemoryAccessLedgerInner>>,
}

#[derive(Debug, Default)]
struct MemoryAccessLedgerInner {
    /// Per-group append-only file lists; a record's index is its identity
    files: HashMap<GroupId, Vec<FileRecord>>,
    /// Recipient directory: address -> registered public key
    directory: HashMap<Address, PublicKey>,
}

impl MemoryAccessLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records registered in a group
    pub fn file_count(&self, group: &GroupId) -> usize {
        self.inner
            .read()
            .files
            .get(group)
            .map(|records| records.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl AccessLedger for MemoryAccessLedger {
    async fn register_file(
        &self,
        group: &GroupId,
        record: FileRecord,
    ) -> Result<u64, LedgerError> {
        // Re-check the pairing invariant at the write boundary
        if record.recipients().len() != record.wrapped_keys().len() {
            return Err(LedgerError::RecordMismatch(
                record.recipients().len(),
                record.wrapped_keys().len(),
            ));
        }

        let mut inner = self.inner.write();
        let records = inner.files.entry(group.clone()).or_default();
        records.push(record);
        Ok((records.len() - 1) as u64)
    }

    async fn get_file(&self, group: &GroupId, index: u64) -> Result<FileRecord, LedgerError> {
        self.inner
            .read()
            .files
            .get(group)
            .and_then(|records| records.get(index as usize))
            .cloned()
            .ok_or_else(|| LedgerError::FileNotFound(group.clone(), index))
    }

    async fn list_files(&self, group: &GroupId) -> Result<Vec<FileRecord>, LedgerError> {
        Ok(self
            .inner
            .read()
            .files
            .get(group)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_public_key(&self, address: &Address) -> Result<Option<PublicKey>, LedgerError> {
        Ok(self.inner.read().directory.get(address).copied())
    }

    async fn set_public_key(&self, address: &Address, key: PublicKey) -> Result<(), LedgerError> {
        self.inner.write().directory.insert(address.clone(), key);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::{SecretKey, WrappedKey};
    use crate::store::ContentHash;

    fn record_named(name: &str) -> FileRecord {
        FileRecord::new(
            name.to_string(),
            ContentHash::compute(name.as_bytes()),
            vec![Address::new("0xaa")],
            vec![WrappedKey::default()],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_assigns_sequential_indices() {
        let ledger = MemoryAccessLedger::new();
        let group = GroupId::new("engineering");

        let first = ledger
            .register_file(&group, record_named("a.txt"))
            .await
            .unwrap();
        let second = ledger
            .register_file(&group, record_named("b.txt"))
            .await
            .unwrap();

        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert_eq!(ledger.file_count(&group), 2);

        let fetched = ledger.get_file(&group, 1).await.unwrap();
        assert_eq!(fetched.file_name(), "b.txt");
    }

    #[tokio::test]
    async fn test_groups_are_independent() {
        let ledger = MemoryAccessLedger::new();
        let eng = GroupId::new("engineering");
        let legal = GroupId::new("legal");

        ledger
            .register_file(&eng, record_named("a.txt"))
            .await
            .unwrap();

        assert_eq!(ledger.file_count(&eng), 1);
        assert_eq!(ledger.file_count(&legal), 0);

        let result = ledger.get_file(&legal, 0).await;
        assert!(matches!(result, Err(LedgerError::FileNotFound(_, 0))));
    }

    #[tokio::test]
    async fn test_list_files_in_registration_order() {
        let ledger = MemoryAccessLedger::new();
        let group = GroupId::new("engineering");

        assert!(ledger.list_files(&group).await.unwrap().is_empty());

        ledger
            .register_file(&group, record_named("a.txt"))
            .await
            .unwrap();
        ledger
            .register_file(&group, record_named("b.txt"))
            .await
            .unwrap();

        let records = ledger.list_files(&group).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].file_name(), "a.txt");
        assert_eq!(records[1].file_name(), "b.txt");

        // Positions in the listing are valid get_file indices
        for (index, record) in records.iter().enumerate() {
            let fetched = ledger.get_file(&group, index as u64).await.unwrap();
            assert_eq!(&fetched, record);
        }
    }

    #[tokio::test]
    async fn test_missing_index_is_not_found() {
        let ledger = MemoryAccessLedger::new();
        let group = GroupId::new("engineering");

        let result = ledger.get_file(&group, 7).await;
        assert!(matches!(result, Err(LedgerError::FileNotFound(g, 7)) if g == group));
    }

    #[tokio::test]
    async fn test_directory_register_and_overwrite() {
        let ledger = MemoryAccessLedger::new();
        let alice = Address::new("0xalice");

        assert!(ledger.get_public_key(&alice).await.unwrap().is_none());

        let first_key = SecretKey::generate().public();
        ledger.set_public_key(&alice, first_key).await.unwrap();
        assert_eq!(
            ledger.get_public_key(&alice).await.unwrap(),
            Some(first_key)
        );

        // Owners may re-register; the previous entry is overwritten
        let second_key = SecretKey::generate().public();
        ledger.set_public_key(&alice, second_key).await.unwrap();
        assert_eq!(
            ledger.get_public_key(&alice).await.unwrap(),
            Some(second_key)
        );
    }
}
