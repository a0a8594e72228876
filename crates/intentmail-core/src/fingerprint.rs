//! Fingerprints: the stable identity label of an agent.
//!
//! A fingerprint is `base64url(SHA-256(agreement_public_key)[0..16])` with
//! padding stripped, always 22 characters. It is used as the primary key
//! for grants, contacts, and relay registrations.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::crypto::X25519PublicKey;
use crate::encoding;
use crate::error::CoreError;

/// Number of hash bytes kept before encoding.
pub const FINGERPRINT_BYTES: usize = 16;

/// Length of the encoded fingerprint string.
pub const FINGERPRINT_LEN: usize = 22;

/// A fingerprint derived from an X25519 agreement public key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint an agreement public key.
    pub fn of(key: &X25519PublicKey) -> Self {
        fingerprint(key.as_bytes())
    }

    /// Parse an encoded fingerprint, checking its shape.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.len() != FINGERPRINT_LEN {
            return Err(CoreError::InvalidFingerprint(format!(
                "expected {} characters, got {}",
                FINGERPRINT_LEN,
                s.len()
            )));
        }
        let raw = encoding::decode_url(s)
            .map_err(|e| CoreError::InvalidFingerprint(e.to_string()))?;
        if raw.len() != FINGERPRINT_BYTES {
            return Err(CoreError::InvalidFingerprint("wrong decoded length".into()));
        }
        Ok(Self(s.to_string()))
    }

    /// Get the encoded form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this fingerprint belongs to the given key.
    pub fn matches(&self, key: &X25519PublicKey) -> bool {
        *self == Self::of(key)
    }
}

/// Fingerprint raw agreement public key bytes.
pub fn fingerprint(agreement_public_key: &[u8]) -> Fingerprint {
    let digest = Sha256::digest(agreement_public_key);
    Fingerprint(encoding::encode_url(&digest[..FINGERPRINT_BYTES]))
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}
