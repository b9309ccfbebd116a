//! Cryptographic primitives for Coffer
//!
//! This module provides the cryptographic foundation for Coffer's security model:
//!
//! - **Recipient keys**: Ed25519 keypairs registered by group members
//! - **Content encryption**: AES-256-GCM with a fresh per-file secret
//! - **Key distribution**: ECDH-based key wrapping using X25519 curve conversion
//!
//! # Security Model
//!
//! ## Per-file secrets
//! Every uploaded file gets its own 256-bit [`Secret`] and 96-bit [`Nonce`].
//! A (key, nonce) pair is never reused: both are generated fresh for each
//! encryption, so compromising one file's key reveals nothing about others.
//!
//! ## Key wrapping protocol
//! To make the file secret available to a recipient:
//! 1. Generate an ephemeral Ed25519 keypair
//! 2. Convert both keys to X25519 (Montgomery curve)
//! 3. Perform ECDH to derive a shared secret
//! 4. Use AES-KW (RFC 3394) to wrap the file secret under the shared secret
//! 5. Package as a [`WrappedKey`] (ephemeral_pubkey || wrapped_secret)
//!
//! The wrap is anonymous-sender: only the recipient's registered public key is
//! needed, and only the holder of the matching private key can unwrap. The
//! private-key side of the operation lives behind the
//! [`IdentityProvider`](crate::identity::IdentityProvider) boundary; the
//! upload and download pipelines never see a recipient's private key.

mod keys;
mod secret;
mod wrapped_key;

pub use keys::{KeyError, PublicKey, SecretKey, PUBLIC_KEY_SIZE};
pub use secret::{Nonce, Secret, SecretError, NONCE_SIZE, SECRET_SIZE, TAG_SIZE};
pub use wrapped_key::{WrappedKey, WrappedKeyError, WRAPPED_KEY_SIZE};
