//! Canonical wire format for stored ciphertext
//!
//! An [`EncryptedEnvelope`] is the only payload ever placed in the content
//! store: the encryption nonce plus the AEAD ciphertext (tag appended),
//! bundled under a version tag. Envelopes are encoded as DAG-CBOR, which
//! gives one canonical byte representation per envelope so that
//! content-addressing round-trips exactly.
//!
//! Envelopes are immutable once stored: the content hash of the encoded
//! bytes is their identity, and a new file version would be a new envelope.

use serde::{Deserialize, Serialize};

use crate::crypto::{Nonce, TAG_SIZE};

/// Current envelope encoding version
pub const ENVELOPE_VERSION: u8 = 1;

/// Errors that can occur while encoding or decoding an envelope
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The bytes do not decode as an envelope
    #[error("malformed envelope: {0}")]
    Malformed(String),
    /// The envelope decoded but was produced by an unknown format version
    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u8),
    #[error("envelope error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Variable-length AEAD ciphertext, tag included
///
/// Serialized as a CBOR byte string rather than an integer sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext(Vec<u8>);

impl Serialize for Ciphertext {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Ciphertext {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Visitor;
        use std::fmt;

        struct CiphertextVisitor;

        impl<'de> Visitor<'de> for CiphertextVisitor {
            type Value = Ciphertext;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a byte array or sequence")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Ciphertext(v.to_vec()))
            }

            fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Ciphertext(v))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut bytes = Vec::new();
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                Ok(Ciphertext(bytes))
            }
        }

        // Try bytes first (for CBOR), fallback to seq (for JSON)
        deserializer.deserialize_byte_buf(CiphertextVisitor)
    }
}

impl From<Vec<u8>> for Ciphertext {
    fn from(bytes: Vec<u8>) -> Self {
        Ciphertext(bytes)
    }
}

impl Ciphertext {
    /// Get a reference to the ciphertext bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the ciphertext in bytes, tag included
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the ciphertext is empty (it never is for a valid envelope)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The canonical bundle persisted to the content store
///
/// Invariant: exactly one envelope per stored file; the envelope's encoded
/// bytes are what the content store hashes, so two byte-identical envelopes
/// may legitimately dedupe to the same content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    /// Encoding version, for forward evolution of the wire format
    version: u8,
    /// The 96-bit nonce the ciphertext was produced under (not secret)
    nonce: Nonce,
    /// AEAD output with the 16-byte authentication tag appended
    ciphertext: Ciphertext,
}

impl EncryptedEnvelope {
    /// Bundle a nonce and ciphertext into a new envelope
    pub fn new(nonce: Nonce, ciphertext: Vec<u8>) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            nonce,
            ciphertext: ciphertext.into(),
        }
    }

    /// Get the nonce
    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    /// Get the ciphertext bytes, tag included
    pub fn ciphertext(&self) -> &[u8] {
        self.ciphertext.bytes()
    }

    /// Encode the envelope to its canonical DAG-CBOR bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        serde_ipld_dagcbor::to_vec(self)
            .map_err(|e| anyhow::anyhow!("envelope encode error: {}", e).into())
    }

    /// Decode an envelope from its canonical DAG-CBOR bytes
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Malformed`] if the bytes do not decode or the
    /// ciphertext is too short to carry an authentication tag, and
    /// [`EnvelopeError::UnsupportedVersion`] for an unknown version tag.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let envelope: EncryptedEnvelope = serde_ipld_dagcbor::from_slice(bytes)
            .map_err(|e| EnvelopeError::Malformed(e.to_string()))?;

        if envelope.version != ENVELOPE_VERSION {
            return Err(EnvelopeError::UnsupportedVersion(envelope.version));
        }
        if envelope.ciphertext.len() < TAG_SIZE {
            return Err(EnvelopeError::Malformed(format!(
                "ciphertext shorter than authentication tag: {} bytes",
                envelope.ciphertext.len()
            )));
        }

        Ok(envelope)
    }
}
