//! Recipient public key resolution
//!
//! Before a file secret can be wrapped, every recipient address must map to
//! a registered public key in the ledger's directory. Resolution is
//! all-or-nothing: one unregistered address fails the whole batch, so an
//! upload can never silently drop a recipient.

use tracing::warn;

use crate::crypto::PublicKey;
use crate::ledger::{AccessLedger, Address, LedgerError};

/// Errors that can occur during recipient resolution
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The address has never registered a public key
    #[error("no public key registered for {0}")]
    MissingKey(Address),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Resolves recipient addresses to their registered public keys
#[derive(Debug, Clone)]
pub struct RecipientKeyResolver<L: AccessLedger> {
    ledger: L,
}

impl<L: AccessLedger> RecipientKeyResolver<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Resolve addresses to public keys, preserving input order
    ///
    /// The returned keys are positionally aligned with the input so that
    /// wrapped keys can be zipped back to addresses by index.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MissingKey`] for the first address without a
    /// directory entry; no partial results are produced.
    pub async fn resolve(&self, addresses: &[Address]) -> Result<Vec<PublicKey>, ResolveError> {
        let mut keys = Vec::with_capacity(addresses.len());
        for address in addresses {
            match self.ledger.get_public_key(address).await? {
                Some(key) => keys.push(key),
                None => {
                    warn!(%address, "recipient has no registered public key");
                    return Err(ResolveError::MissingKey(address.clone()));
                }
            }
        }
        Ok(keys)
    }
}
