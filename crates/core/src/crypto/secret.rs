//! Content encryption using AES-256-GCM
//!
//! Every uploaded file is encrypted under its own fresh [`Secret`] with a
//! fresh [`Nonce`]. Invariant: a (key, nonce) pair is never reused. Since
//! both are generated per upload, a single random 96-bit nonce per file is
//! safe, but the nonce is generated fresh on every encryption regardless.
//!
//! Decryption verifies the 128-bit authentication tag before releasing any
//! plaintext. Tag mismatch yields [`SecretError::Authentication`] and zero
//! bytes, never partial output.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key,
};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of an AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;
/// Size of a content encryption key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;
/// Size of the GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    /// The authentication tag did not verify: wrong key, or the
    /// ciphertext/nonce was tampered with.
    #[error("authentication failure")]
    Authentication,
    #[error("secret error: {0}")]
    Default(#[from] anyhow::Error),
}

/// A 256-bit symmetric key used to encrypt a single file
///
/// A `Secret` exists only in process memory for the duration of one upload or
/// one download, and is zeroized when dropped. It is never serialized and
/// never placed in the content store or the ledger; it leaves the process
/// only in wrapped form (see [`WrappedKey`](super::WrappedKey)).
#[derive(Clone, PartialEq, Zeroize, ZeroizeOnDrop)]
pub struct Secret([u8; SECRET_SIZE]);

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(..)")
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl Secret {
    /// Generate a new random secret using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut buff = [0; SECRET_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Create a secret from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SECRET_SIZE {
            return Err(anyhow::anyhow!(
                "invalid secret size, expected {}, got {}",
                SECRET_SIZE,
                data.len()
            )
            .into());
        }
        let mut buff = [0; SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Get a reference to the secret key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Encrypt data under this secret with the given nonce
    ///
    /// Returns the ciphertext with the 16-byte authentication tag appended.
    /// The nonce is not included in the output; the envelope carries it as a
    /// separate field. Callers must pass a freshly generated nonce.
    ///
    /// # Errors
    ///
    /// Returns an error only on internal cipher failure.
    pub fn encrypt(&self, nonce: &Nonce, plaintext: &[u8]) -> Result<Vec<u8>, SecretError> {
        let key = Key::<Aes256Gcm>::from_slice(self.bytes());
        let cipher = Aes256Gcm::new(key);
        cipher
            .encrypt(aes_gcm::Nonce::from_slice(nonce.bytes()), plaintext)
            .map_err(|_| anyhow::anyhow!("encrypt error").into())
    }

    /// Decrypt data under this secret with the given nonce
    ///
    /// The authentication tag is verified before any plaintext is returned.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::Authentication`] if the tag does not verify:
    /// wrong key, tampered ciphertext, or tampered nonce.
    pub fn decrypt(&self, nonce: &Nonce, ciphertext: &[u8]) -> Result<Vec<u8>, SecretError> {
        if ciphertext.len() < TAG_SIZE {
            return Err(SecretError::Authentication);
        }

        let key = Key::<Aes256Gcm>::from_slice(self.bytes());
        let cipher = Aes256Gcm::new(key);
        cipher
            .decrypt(aes_gcm::Nonce::from_slice(nonce.bytes()), ciphertext)
            .map_err(|_| SecretError::Authentication)
    }
}

/// A 96-bit AES-GCM nonce, generated fresh per encryption
///
/// The nonce is not secret; it is stored alongside the ciphertext in the
/// [`EncryptedEnvelope`](crate::envelope::EncryptedEnvelope).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Serialize for Nonce {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{Error, Visitor};
        use std::fmt;

        struct NonceVisitor;

        impl<'de> Visitor<'de> for NonceVisitor {
            type Value = Nonce;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a byte array or sequence of NONCE_SIZE")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: Error,
            {
                if v.len() != NONCE_SIZE {
                    return Err(E::invalid_length(
                        v.len(),
                        &format!("expected {} bytes", NONCE_SIZE).as_str(),
                    ));
                }
                let mut array = [0u8; NONCE_SIZE];
                array.copy_from_slice(v);
                Ok(Nonce(array))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut bytes = Vec::new();
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                if bytes.len() != NONCE_SIZE {
                    return Err(A::Error::invalid_length(
                        bytes.len(),
                        &format!("expected {} bytes", NONCE_SIZE).as_str(),
                    ));
                }
                let mut array = [0u8; NONCE_SIZE];
                array.copy_from_slice(&bytes);
                Ok(Nonce(array))
            }
        }

        // Try bytes first (for CBOR), fallback to seq (for JSON)
        deserializer.deserialize_byte_buf(NonceVisitor)
    }
}

impl From<[u8; NONCE_SIZE]> for Nonce {
    fn from(bytes: [u8; NONCE_SIZE]) -> Self {
        Nonce(bytes)
    }
}

impl Nonce {
    /// Generate a new random nonce using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut buff = [0; NONCE_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Get a reference to the nonce bytes
    pub fn bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}
