//! Shared test utilities for upload/download integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use coffer::prelude::*;

/// A full set of in-memory collaborators plus member key material
pub struct TestBed {
    pub store: MemoryContentStore,
    pub ledger: MemoryAccessLedger,
    pub wallet: LocalWallet,
}

impl TestBed {
    pub fn new() -> Self {
        Self {
            store: MemoryContentStore::new(),
            ledger: MemoryAccessLedger::new(),
            wallet: LocalWallet::new(),
        }
    }

    /// Enroll a member: generate a keypair, register the public key in the
    /// directory, and import the secret key into the local wallet.
    pub async fn enroll(&self, address: &str) -> (Address, SecretKey) {
        let address = Address::new(address);
        let secret_key = SecretKey::generate();
        self.ledger
            .set_public_key(&address, secret_key.public())
            .await
            .unwrap();
        self.wallet.import(address.clone(), secret_key.clone());
        (address, secret_key)
    }

    pub fn uploader(&self) -> Uploader<MemoryContentStore, MemoryAccessLedger> {
        Uploader::new(self.store.clone(), self.ledger.clone())
    }

    pub fn downloader(&self) -> Downloader<MemoryContentStore, MemoryAccessLedger, LocalWallet> {
        Downloader::new(self.store.clone(), self.ledger.clone(), self.wallet.clone())
    }

    /// Downloader routed through an arbitrary identity provider
    pub fn downloader_with<I: IdentityProvider>(
        &self,
        identity: I,
    ) -> Downloader<MemoryContentStore, MemoryAccessLedger, I> {
        Downloader::new(self.store.clone(), self.ledger.clone(), identity)
    }
}

/// Deterministic pseudo-random plaintext of a given length
pub fn sample_plaintext(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// Identity provider wrapper that counts unwrap invocations
#[derive(Debug, Clone)]
pub struct CountingWallet<I: IdentityProvider> {
    inner: I,
    unwraps: Arc<AtomicUsize>,
}

impl<I: IdentityProvider> CountingWallet<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            unwraps: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unwrap_calls(&self) -> usize {
        self.unwraps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<I: IdentityProvider> IdentityProvider for CountingWallet<I> {
    async fn public_key(&self, identity: &Address) -> Result<PublicKey, IdentityError> {
        self.inner.public_key(identity).await
    }

    async fn unwrap_key(
        &self,
        wrapped: &WrappedKey,
        identity: &Address,
    ) -> Result<Secret, IdentityError> {
        self.unwraps.fetch_add(1, Ordering::SeqCst);
        self.inner.unwrap_key(wrapped, identity).await
    }
}

/// Identity provider that refuses every unwrap, as a user rejecting a
/// wallet prompt would
#[derive(Debug, Clone)]
pub struct DecliningWallet;

#[async_trait]
impl IdentityProvider for DecliningWallet {
    async fn public_key(&self, identity: &Address) -> Result<PublicKey, IdentityError> {
        Err(IdentityError::UnknownIdentity(identity.clone()))
    }

    async fn unwrap_key(
        &self,
        _wrapped: &WrappedKey,
        _identity: &Address,
    ) -> Result<Secret, IdentityError> {
        Err(IdentityError::Declined)
    }
}
