/**
 * Cryptographic types and operations.
 *  - Recipient public/private key implementations
 *  - Per-file content encryption (AES-256-GCM)
 *  - Per-recipient key wrapping (ECDH + AES-KW)
 */
pub mod crypto;
/**
 * Canonical wire format for stored ciphertext:
 *  version + nonce + ciphertext, encoded as
 *  DAG-CBOR for stable content addressing.
 */
pub mod envelope;
/**
 * Identity provider boundary. Holds the recipient's
 *  private key outside the core and performs the
 *  unwrap operation on its behalf.
 */
pub mod identity;
/**
 * Access-control ledger boundary: the recipient
 *  directory and per-group append-only file records.
 */
pub mod ledger;
/**
 * Resolution of recipient addresses to registered
 *  public keys. Fails closed on unregistered addresses.
 */
pub mod resolver;
/**
 * Content-addressed blob store boundary. The only
 *  payload it ever holds is an encrypted envelope.
 */
pub mod store;
/**
 * The upload and download pipelines that tie the
 *  above together, one linear async task per call.
 */
pub mod transfer;

pub mod prelude {
    pub use crate::crypto::{Nonce, PublicKey, Secret, SecretKey, WrappedKey};
    pub use crate::envelope::{EncryptedEnvelope, EnvelopeError};
    pub use crate::identity::{IdentityError, IdentityProvider, LocalWallet};
    pub use crate::ledger::{
        AccessLedger, Address, FileRecord, GroupId, LedgerError, MemoryAccessLedger,
    };
    pub use crate::resolver::{RecipientKeyResolver, ResolveError};
    pub use crate::store::{ContentHash, ContentStore, MemoryContentStore, StoreError};
    pub use crate::transfer::{DownloadError, Downloader, UploadError, UploadReceipt, Uploader};
}
