//! Sealed envelopes: the encrypted wire form of a signed message.
//!
//! A sealed envelope is `{ephemeralPublicKey, ciphertext}`. The sender
//! generates a fresh X25519 key per message, agrees on a secret with the
//! recipient's agreement key, derives a ChaCha20-Poly1305 key and nonce with
//! HKDF, and encrypts. The ciphertext carries the authentication tag, so
//! any modification is detected on open.

use serde::{Deserialize, Serialize};

use intentmail_core::{X25519PublicKey, X25519StaticSecret};

use crate::crypto::{EphemeralKeyPair, SharedKey, TAG_LEN};
use crate::error::{PermsError, Result};

/// The only object that crosses the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SealedEnvelope {
    /// Sender's one-time X25519 public key.
    pub ephemeral_public_key: X25519PublicKey,

    /// ChaCha20-Poly1305 output (ciphertext || tag), base64 on the wire.
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
}

impl SealedEnvelope {
    /// Encrypt `plaintext` for the holder of `recipient_public`.
    pub fn seal(plaintext: &[u8], recipient_public: &X25519PublicKey) -> Result<Self> {
        let ephemeral = EphemeralKeyPair::generate()?;
        let ephemeral_public = ephemeral.public_key();

        let shared = ephemeral.diffie_hellman(recipient_public);
        if shared.is_degenerate() {
            return Err(PermsError::EncryptionError(
                "recipient key is a low-order point".into(),
            ));
        }

        let (key, nonce) = shared.derive_seal_keys(&ephemeral_public, recipient_public)?;
        let ciphertext = key.encrypt(plaintext, &nonce, ephemeral_public.as_bytes())?;

        Ok(Self {
            ephemeral_public_key: ephemeral_public,
            ciphertext,
        })
    }

    /// Decrypt with the recipient's agreement secret.
    ///
    /// Fails on any tampering, on the wrong key, and on malformed input;
    /// never returns partial plaintext.
    pub fn open(&self, recipient_secret: &X25519StaticSecret) -> Result<Vec<u8>> {
        if self.ciphertext.len() < TAG_LEN {
            return Err(PermsError::DecryptionError(format!(
                "ciphertext of {} bytes is shorter than the tag",
                self.ciphertext.len()
            )));
        }

        let shared = SharedKey::agree(recipient_secret, &self.ephemeral_public_key);
        if shared.is_degenerate() {
            return Err(PermsError::DecryptionError(
                "ephemeral key is a low-order point".into(),
            ));
        }

        let recipient_public = recipient_secret.public_key();
        let (key, nonce) = shared.derive_seal_keys(&self.ephemeral_public_key, &recipient_public)?;
        key.decrypt(&self.ciphertext, &nonce, self.ephemeral_public_key.as_bytes())
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| PermsError::SerializationError(e.to_string()))
    }

    /// Deserialize from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| PermsError::SerializationError(e.to_string()))
    }
}

/// Seal `plaintext` for a recipient.
pub fn encrypt(plaintext: &[u8], recipient_public: &X25519PublicKey) -> Result<SealedEnvelope> {
    SealedEnvelope::seal(plaintext, recipient_public)
}

/// Open a sealed envelope.
pub fn decrypt(sealed: &SealedEnvelope, recipient_secret: &X25519StaticSecret) -> Result<Vec<u8>> {
    sealed.open(recipient_secret)
}

mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    use intentmail_core::encoding;

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&encoding::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        encoding::decode(&s).map_err(serde::de::Error::custom)
    }
}
