//! Upload and download pipelines
//!
//! Each pipeline is one linear async task that suspends at every
//! collaborator call and returns a single result or error:
//!
//! ```text
//! upload:   resolve keys -> generate secret+nonce -> encrypt -> wrap (xN)
//!              -> store.put -> ledger.register_file
//! download: ledger.get_file -> authorize -> store.get -> parse envelope
//!              -> identity.unwrap_key -> decrypt
//! ```
//!
//! Pipelines hold no shared mutable state; each call owns its own secret,
//! nonce, and envelope, so concurrent uploads and downloads need no locking.
//! Dropping the future at any suspension point cancels the operation; the
//! ledger write is last in the upload pipeline, so cancellation before it
//! leaves nothing registered.

mod download;
mod upload;

pub use download::{DownloadError, Downloader};
pub use upload::{UploadError, UploadReceipt, Uploader};
