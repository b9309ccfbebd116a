use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::crypto::{PublicKey, Secret, SecretKey, WrappedKey};
use crate::ledger::Address;

use super::{IdentityError, IdentityProvider};

/// In-process identity provider holding keys for local identities
///
/// Useful for tests and for running the pipeline without an external wallet.
/// Keys are held in memory only; nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct LocalWallet {
    inner: Arc<RwLock<HashMap<Address, SecretKey>>>,
}

impl LocalWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identity's secret key to the wallet
    pub fn import(&self, address: Address, secret_key: SecretKey) {
        self.inner.write().insert(address, secret_key);
    }

    fn key_for(&self, identity: &Address) -> Result<SecretKey, IdentityError> {
        self.inner
            .read()
            .get(identity)
            .cloned()
            .ok_or_else(|| IdentityError::UnknownIdentity(identity.clone()))
    }
}

#[async_trait]
impl IdentityProvider for LocalWallet {
    async fn public_key(&self, identity: &Address) -> Result<PublicKey, IdentityError> {
        Ok(self.key_for(identity)?.public())
    }

    async fn unwrap_key(
        &self,
        wrapped: &WrappedKey,
        identity: &Address,
    ) -> Result<Secret, IdentityError> {
        let secret_key = self.key_for(identity)?;
        let secret = wrapped
            .open(&secret_key)
            .map_err(|e| anyhow::anyhow!("key unwrap failed: {}", e))?;
        Ok(secret)
    }
}
