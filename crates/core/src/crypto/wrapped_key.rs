//! Per-recipient key wrapping using ECDH + AES Key Wrap
//!
//! This module implements the sealing of a file's content key for a single
//! recipient. It combines Elliptic Curve Diffie-Hellman (ECDH) for key
//! agreement with AES Key Wrap (RFC 3394) for key encryption.
//!
//! # Protocol Overview
//!
//! To wrap a secret for a recipient:
//! 1. **Generate ephemeral keypair**: Create a temporary Ed25519 keypair
//! 2. **Perform ECDH**: Convert keys to X25519 and compute shared secret
//! 3. **Wrap key**: Use AES-KW to encrypt the file secret with the shared secret
//! 4. **Package**: Create a `WrappedKey` of ephemeral public key and wrapped secret
//!
//! The recipient's side of the operation:
//! 1. **Extract ephemeral key**: Read the ephemeral public key from the wrap
//! 2. **Perform ECDH**: Use their private key to compute the same shared secret
//! 3. **Unwrap key**: Use AES-KW to decrypt the file secret
//!
//! # Security Properties
//!
//! - **Anonymous sender**: no sender key is involved; only the recipient's
//!   registered public key is required to wrap
//! - **Non-deterministic**: the ephemeral keypair makes every wrap distinct,
//!   even for the same secret and recipient
//! - **Integrity**: AES-KW authenticates the wrapped key, so unwrapping with
//!   the wrong private key fails rather than yielding garbage

use std::convert::TryFrom;

use aes_kw::KekAes256 as Kek;
use serde::{Deserialize, Serialize};

use super::keys::{KeyError, PublicKey, SecretKey, PUBLIC_KEY_SIZE};
use super::secret::{Secret, SecretError, SECRET_SIZE};

/// Bytes of integrity overhead AES-KW adds to the wrapped secret
pub const KW_OVERHEAD: usize = 8;
/// Total size of a WrappedKey in bytes
///
/// Layout: ephemeral_pubkey (32) || wrapped_secret (40) = 72 bytes
pub const WRAPPED_KEY_SIZE: usize = PUBLIC_KEY_SIZE + SECRET_SIZE + KW_OVERHEAD;

/// Errors that can occur during key wrapping or unwrapping
#[derive(Debug, thiserror::Error)]
pub enum WrappedKeyError {
    #[error("wrapped key error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
}

/// A file secret sealed for exactly one recipient
///
/// A `WrappedKey` contains an ephemeral public key and an AES-KW wrapped
/// secret. Only the holder of the private key matching the recipient public
/// key used during [`WrappedKey::seal`] can recover the secret. One wrap is
/// produced per recipient per file, and the ledger pairs each wrap
/// positionally with its recipient address.
///
/// # Wire Format
///
/// ```text
/// [ ephemeral_pubkey: 32 bytes ][ wrapped_secret: 40 bytes ]
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct WrappedKey(pub(crate) [u8; WRAPPED_KEY_SIZE]);

impl Serialize for WrappedKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for WrappedKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{Error, Visitor};
        use std::fmt;

        struct WrappedKeyVisitor;

        impl<'de> Visitor<'de> for WrappedKeyVisitor {
            type Value = WrappedKey;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a byte array or sequence of WRAPPED_KEY_SIZE")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: Error,
            {
                if v.len() != WRAPPED_KEY_SIZE {
                    return Err(E::invalid_length(
                        v.len(),
                        &format!("expected {} bytes", WRAPPED_KEY_SIZE).as_str(),
                    ));
                }
                let mut array = [0u8; WRAPPED_KEY_SIZE];
                array.copy_from_slice(v);
                Ok(WrappedKey(array))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut bytes = Vec::new();
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                if bytes.len() != WRAPPED_KEY_SIZE {
                    return Err(A::Error::invalid_length(
                        bytes.len(),
                        &format!("expected {} bytes", WRAPPED_KEY_SIZE).as_str(),
                    ));
                }
                let mut array = [0u8; WRAPPED_KEY_SIZE];
                array.copy_from_slice(&bytes);
                Ok(WrappedKey(array))
            }
        }

        // Try bytes first (for CBOR), fallback to seq (for JSON)
        deserializer.deserialize_byte_buf(WrappedKeyVisitor)
    }
}

impl Default for WrappedKey {
    fn default() -> Self {
        WrappedKey([0; WRAPPED_KEY_SIZE])
    }
}

impl From<[u8; WRAPPED_KEY_SIZE]> for WrappedKey {
    fn from(bytes: [u8; WRAPPED_KEY_SIZE]) -> Self {
        WrappedKey(bytes)
    }
}

impl From<WrappedKey> for [u8; WRAPPED_KEY_SIZE] {
    fn from(wrap: WrappedKey) -> Self {
        wrap.0
    }
}

impl TryFrom<&[u8]> for WrappedKey {
    type Error = WrappedKeyError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != WRAPPED_KEY_SIZE {
            return Err(anyhow::anyhow!(
                "invalid wrapped key size, expected {}, got {}",
                WRAPPED_KEY_SIZE,
                bytes.len()
            )
            .into());
        }
        let mut wrap = WrappedKey::default();
        wrap.0.copy_from_slice(bytes);
        Ok(wrap)
    }
}

impl WrappedKey {
    /// Parse a wrapped key from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, WrappedKeyError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0; WRAPPED_KEY_SIZE];
        hex::decode_to_slice(hex, &mut buff).map_err(|_| anyhow::anyhow!("hex decode error"))?;
        Ok(WrappedKey::from(buff))
    }

    /// Convert wrapped key to hexadecimal string
    #[allow(clippy::wrong_self_convention)]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Seal a secret for a specific recipient
    ///
    /// 1. Generates an ephemeral Ed25519 keypair
    /// 2. Converts both keys to X25519 for ECDH
    /// 3. Performs ECDH to derive a shared secret
    /// 4. Uses AES-KW to wrap the secret with the shared secret
    /// 5. Returns [ephemeral_pubkey || wrapped_secret]
    ///
    /// # Arguments
    ///
    /// * `secret` - The file's content encryption key
    /// * `recipient` - The registered public key of the intended recipient
    ///
    /// # Errors
    ///
    /// Returns an error if key conversion or wrapping fails.
    pub fn seal(secret: &Secret, recipient: &PublicKey) -> Result<Self, WrappedKeyError> {
        // Generate ephemeral Ed25519 keypair
        let ephemeral_private = SecretKey::generate();
        let ephemeral_public = ephemeral_private.public();

        // Convert both keys to X25519 for ECDH
        let ephemeral_x25519_private = ephemeral_private.to_x25519();
        let recipient_x25519_public = recipient.to_x25519()?;

        // Perform ECDH to get shared secret
        let shared_secret = ephemeral_x25519_private.diffie_hellman(&recipient_x25519_public);

        // Use shared secret as KEK for AES-KW
        let mut shared_secret_bytes = [0; SECRET_SIZE];
        shared_secret_bytes.copy_from_slice(shared_secret.as_bytes());
        let kek = Kek::from(shared_secret_bytes);
        let wrapped = kek
            .wrap_vec(secret.bytes())
            .map_err(|_| anyhow::anyhow!("AES-KW wrap error"))?;

        // Build wrap: ephemeral_public_key || wrapped_secret
        let mut wrap = WrappedKey::default();
        let ephemeral_bytes = ephemeral_public.to_bytes();

        // sanity check we're getting `WRAPPED_KEY_SIZE` bytes here
        if ephemeral_bytes.len() + wrapped.len() != WRAPPED_KEY_SIZE {
            return Err(anyhow::anyhow!("expected wrapped key size is incorrect").into());
        };

        wrap.0[..PUBLIC_KEY_SIZE].copy_from_slice(&ephemeral_bytes);
        wrap.0[PUBLIC_KEY_SIZE..PUBLIC_KEY_SIZE + wrapped.len()].copy_from_slice(&wrapped);

        Ok(wrap)
    }

    /// Recover the wrapped secret using the recipient's private key
    ///
    /// This reverses the sealing process: extract the ephemeral public key,
    /// perform the same ECDH, unwrap with AES-KW.
    ///
    /// This is the identity-provider side of the protocol; the upload and
    /// download pipelines never call it directly.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Key conversion fails
    /// - AES-KW unwrapping fails (wrong key or corrupted data)
    /// - Unwrapped secret has incorrect size
    pub fn open(&self, recipient_secret: &SecretKey) -> Result<Secret, WrappedKeyError> {
        // Extract the ephemeral public key
        let ephemeral_public_bytes = &self.0[..PUBLIC_KEY_SIZE];
        let ephemeral_public = PublicKey::try_from(ephemeral_public_bytes)?;

        // Convert keys to X25519 for ECDH
        let recipient_x25519_private = recipient_secret.to_x25519();
        let ephemeral_x25519_public = ephemeral_public.to_x25519()?;

        // Perform ECDH to get same shared secret
        let shared_secret = recipient_x25519_private.diffie_hellman(&ephemeral_x25519_public);

        // Use shared secret as KEK for AES-KW unwrapping
        let shared_secret_bytes = *shared_secret.as_bytes();
        let kek = Kek::from(shared_secret_bytes);
        let wrapped_data = &self.0[PUBLIC_KEY_SIZE..];

        let unwrapped = kek
            .unwrap_vec(wrapped_data)
            .map_err(|_| anyhow::anyhow!("AES-KW unwrap error"))?;

        if unwrapped.len() != SECRET_SIZE {
            return Err(anyhow::anyhow!("unwrapped secret has wrong size").into());
        }

        let mut secret_bytes = [0; SECRET_SIZE];
        secret_bytes.copy_from_slice(&unwrapped);
        Ok(Secret::from(secret_bytes))
    }

    /// Get a reference to the raw wrapped key bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_seal_open() {
        let secret = Secret::from_slice(&[42u8; SECRET_SIZE]).unwrap();
        let private_key = SecretKey::generate();
        let public_key = private_key.public();
        let wrap = WrappedKey::seal(&secret, &public_key).unwrap();
        let recovered = wrap.open(&private_key).unwrap();
        assert_eq!(secret, recovered);
    }

    #[test]
    fn test_open_with_wrong_key_fails() {
        let secret = Secret::generate();
        let alice_private = SecretKey::generate();
        let alice_public = alice_private.public();
        let bob_private = SecretKey::generate();

        // Sealed for Alice
        let wrap = WrappedKey::seal(&secret, &alice_public).unwrap();

        // Alice can recover the secret
        let recovered_by_alice = wrap.open(&alice_private).unwrap();
        assert_eq!(secret, recovered_by_alice);

        // Bob cannot
        let result = wrap.open(&bob_private);
        assert!(result.is_err());
    }

    #[test]
    fn test_seal_is_not_deterministic() {
        let secret = Secret::generate();
        let public_key = SecretKey::generate().public();

        let first = WrappedKey::seal(&secret, &public_key).unwrap();
        let second = WrappedKey::seal(&secret, &public_key).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_hex_roundtrip() {
        let secret = Secret::generate();
        let private_key = SecretKey::generate();
        let wrap = WrappedKey::seal(&secret, &private_key.public()).unwrap();

        let hex = wrap.to_hex();
        let recovered_wrap = WrappedKey::from_hex(&hex).unwrap();
        assert_eq!(wrap, recovered_wrap);

        let recovered_secret = recovered_wrap.open(&private_key).unwrap();
        assert_eq!(secret, recovered_secret);
    }

    #[test]
    fn test_serde_roundtrip() {
        let secret = Secret::generate();
        let private_key = SecretKey::generate();
        let wrap = WrappedKey::seal(&secret, &private_key.public()).unwrap();

        // CBOR (the ledger record encoding)
        let encoded = serde_ipld_dagcbor::to_vec(&wrap).unwrap();
        let decoded: WrappedKey = serde_ipld_dagcbor::from_slice(&encoded).unwrap();
        assert_eq!(wrap, decoded);

        // JSON (human-readable fallback)
        let json = serde_json::to_string(&wrap).unwrap();
        let from_json: WrappedKey = serde_json::from_str(&json).unwrap();
        assert_eq!(wrap, from_json);

        let recovered = decoded.open(&private_key).unwrap();
        assert_eq!(secret, recovered);
    }

    #[test]
    fn test_try_from_invalid_length() {
        let short = vec![0u8; WRAPPED_KEY_SIZE - 1];
        assert!(WrappedKey::try_from(short.as_slice()).is_err());

        let long = vec![0u8; WRAPPED_KEY_SIZE + 1];
        assert!(WrappedKey::try_from(long.as_slice()).is_err());

        let exact = vec![0u8; WRAPPED_KEY_SIZE];
        assert!(WrappedKey::try_from(exact.as_slice()).is_ok());
    }
}
