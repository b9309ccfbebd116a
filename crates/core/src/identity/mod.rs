//! Identity provider boundary
//!
//! A recipient's private key never enters the core. Anything that can hold
//! one (a wallet prompting its user, an HSM, a test double) sits behind
//! the [`IdentityProvider`] trait and performs the unwrap itself, handing
//! back only the recovered content key.
//!
//! The provider may take unbounded wall-clock time (a human may be looking
//! at an approval prompt); callers suspend at the `.await` and may cancel
//! by dropping the future. A refusal is [`IdentityError::Declined`], which
//! is deliberately distinct from a cryptographic unwrap failure.

mod local;

use async_trait::async_trait;

use crate::crypto::{PublicKey, Secret, WrappedKey};
use crate::ledger::Address;

pub use local::LocalWallet;

/// Errors an identity provider can report
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The identity holder refused the unwrap (e.g. rejected a wallet prompt)
    #[error("unwrap declined by identity holder")]
    Declined,
    /// The provider holds no key material for this identity
    #[error("unknown identity: {0}")]
    UnknownIdentity(Address),
    /// The provider failed, including cryptographic unwrap failure
    #[error("identity provider error: {0}")]
    Provider(#[from] anyhow::Error),
}

/// Holder of private key material, external to the core
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug + Clone + 'static {
    /// The public key this identity would register in the directory
    async fn public_key(&self, identity: &Address) -> Result<PublicKey, IdentityError>;

    /// Unwrap a wrapped key on behalf of an identity
    ///
    /// The private-key operation happens inside the provider; only the
    /// recovered secret crosses the boundary.
    async fn unwrap_key(
        &self,
        wrapped: &WrappedKey,
        identity: &Address,
    ) -> Result<Secret, IdentityError>;
}
