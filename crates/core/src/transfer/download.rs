use tracing::{debug, warn};

use crate::envelope::{EncryptedEnvelope, EnvelopeError};
use crate::identity::{IdentityError, IdentityProvider};
use crate::ledger::{AccessLedger, Address, GroupId, LedgerError};
use crate::store::{ContentStore, StoreError};

/// Errors that can occur during a download
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The requester is not in the file's recipient list; no key material
    /// was touched and the identity provider was never invoked
    #[error("requester {0} is not an authorized recipient")]
    NotAuthorized(Address),
    /// The stored envelope bytes do not parse
    #[error("corrupt envelope: {0}")]
    CorruptEnvelope(#[source] EnvelopeError),
    /// The identity provider declined or failed the unwrap
    #[error("key unwrap failed: {0}")]
    Unwrap(#[from] IdentityError),
    /// The AEAD tag did not verify: the stored content was tampered with
    /// or corrupted, and no plaintext is returned
    #[error("content failed authentication: tampered or corrupted")]
    TamperedOrCorrupted,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Coordinates one download as a single logical transaction
///
/// Authorization is checked against the ledger record before anything is
/// fetched or any cryptographic work is attempted.
#[derive(Debug, Clone)]
pub struct Downloader<S: ContentStore, L: AccessLedger, I: IdentityProvider> {
    store: S,
    ledger: L,
    identity: I,
}

impl<S: ContentStore, L: AccessLedger, I: IdentityProvider> Downloader<S, L, I> {
    pub fn new(store: S, ledger: L, identity: I) -> Self {
        Self {
            store,
            ledger,
            identity,
        }
    }

    /// Fetch and decrypt a shared file on behalf of a requester
    ///
    /// 1. Fetch the file record from the ledger
    /// 2. Locate the requester in the recipient list; absent means
    ///    [`DownloadError::NotAuthorized`], with no decryption attempted
    /// 3. Fetch and parse the envelope from the content store
    /// 4. Unwrap the requester's wrapped key via the identity provider
    /// 5. Decrypt and authenticate the content
    ///
    /// The returned plaintext is the caller's to interpret; content-type
    /// detection is a presentation concern.
    pub async fn download(
        &self,
        group: &GroupId,
        file_index: u64,
        requester: &Address,
    ) -> Result<Vec<u8>, DownloadError> {
        let record = self.ledger.get_file(group, file_index).await?;

        let position = match record.position_of(requester) {
            Some(position) => position,
            None => {
                warn!(%group, file_index, %requester, "requester not in recipient list");
                return Err(DownloadError::NotAuthorized(requester.clone()));
            }
        };

        let bytes = self.store.get(record.content_hash()).await?;
        let envelope =
            EncryptedEnvelope::from_bytes(&bytes).map_err(DownloadError::CorruptEnvelope)?;

        let wrapped = &record.wrapped_keys()[position];
        let secret = self.identity.unwrap_key(wrapped, requester).await?;

        let plaintext = secret
            .decrypt(envelope.nonce(), envelope.ciphertext())
            .map_err(|_| DownloadError::TamperedOrCorrupted)?;
        debug!(%group, file_index, bytes = plaintext.len(), "decrypted file content");

        Ok(plaintext)
    }
}
