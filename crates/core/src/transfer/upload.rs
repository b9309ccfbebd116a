use bytes::Bytes;
use tracing::debug;

use crate::crypto::{Nonce, Secret, SecretError, WrappedKey, WrappedKeyError};
use crate::envelope::{EncryptedEnvelope, EnvelopeError};
use crate::ledger::{AccessLedger, Address, FileRecord, GroupId, LedgerError};
use crate::resolver::{RecipientKeyResolver, ResolveError};
use crate::store::{ContentStore, StoreError};

/// Errors that can occur during an upload
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The caller provided an empty recipient list
    #[error("at least one recipient is required")]
    NoRecipients,
    /// A recipient has never registered a public key; nothing was written
    #[error("no public key registered for {0}")]
    MissingKey(Address),
    #[error("encrypt error: {0}")]
    Encrypt(#[from] SecretError),
    #[error("key wrap error: {0}")]
    Wrap(#[from] WrappedKeyError),
    #[error("envelope encode error: {0}")]
    Envelope(#[from] EnvelopeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<ResolveError> for UploadError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::MissingKey(address) => UploadError::MissingKey(address),
            ResolveError::Ledger(err) => UploadError::Ledger(err),
        }
    }
}

/// Result of a completed upload
///
/// Carries the ledger-assigned index alongside the registered record; the
/// index is what a recipient needs to download the file later.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub file_index: u64,
    pub record: FileRecord,
}

/// Coordinates one upload as a single logical transaction
///
/// Failure at any step aborts the whole upload. Steps are ordered so that
/// all fallible cryptographic work happens before any external write, and
/// the ledger registration comes last: a caller that cancels (drops the
/// future) before registration has observed no side effect beyond an
/// orphaned, unreferenced blob at worst.
#[derive(Debug, Clone)]
pub struct Uploader<S: ContentStore, L: AccessLedger> {
    store: S,
    ledger: L,
    resolver: RecipientKeyResolver<L>,
}

impl<S: ContentStore, L: AccessLedger> Uploader<S, L> {
    pub fn new(store: S, ledger: L) -> Self {
        let resolver = RecipientKeyResolver::new(ledger.clone());
        Self {
            store,
            ledger,
            resolver,
        }
    }

    /// Encrypt a file for a set of recipients and register it with the group
    ///
    /// 1. Validate the recipient list is non-empty
    /// 2. Resolve every recipient's registered public key (all-or-nothing)
    /// 3. Generate a fresh content secret and nonce
    /// 4. Encrypt the plaintext
    /// 5. Wrap the secret for each recipient, preserving address order,
    ///    then drop the secret (zeroized)
    /// 6. Put the encoded envelope in the content store
    /// 7. Register the file record with the ledger
    ///
    /// # Errors
    ///
    /// Any failure is terminal for this upload. Before step 6 nothing has
    /// been written anywhere.
    pub async fn upload(
        &self,
        plaintext: &[u8],
        recipients: &[Address],
        group: &GroupId,
        file_name: &str,
    ) -> Result<UploadReceipt, UploadError> {
        if recipients.is_empty() {
            return Err(UploadError::NoRecipients);
        }

        let public_keys = self.resolver.resolve(recipients).await?;

        let secret = Secret::generate();
        let nonce = Nonce::generate();
        let ciphertext = secret.encrypt(&nonce, plaintext)?;

        let wrapped_keys = public_keys
            .iter()
            .map(|key| WrappedKey::seal(&secret, key))
            .collect::<Result<Vec<_>, _>>()?;

        // The secret now exists only in wrapped form
        drop(secret);

        let envelope = EncryptedEnvelope::new(nonce, ciphertext);
        let bytes = envelope.to_bytes()?;
        let content_hash = self.store.put(Bytes::from(bytes)).await?;
        debug!(
            %content_hash,
            file_name,
            recipients = recipients.len(),
            "stored encrypted envelope"
        );

        let record = FileRecord::new(
            file_name.to_string(),
            content_hash,
            recipients.to_vec(),
            wrapped_keys,
        )?;
        let file_index = self.ledger.register_file(group, record.clone()).await?;
        debug!(%group, file_index, "registered file record");

        Ok(UploadReceipt { file_index, record })
    }
}
