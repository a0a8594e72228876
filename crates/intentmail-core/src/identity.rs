//! Agent identity: key material and the public identity card.
//!
//! Every agent owns one [`KeyMaterial`]: an Ed25519 keypair for signing
//! envelopes and an X25519 keypair for receiving sealed messages. The
//! agreement public key determines the agent's [`Fingerprint`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::{
    random_secret, Ed25519PublicKey, SigningKeypair, X25519PublicKey, X25519StaticSecret,
};
use crate::encoding;
use crate::error::CoreError;
use crate::fingerprint::Fingerprint;
use crate::types::validate_agent_id;

/// The complete secret key set of one identity.
///
/// Created once at identity initialization and immutable thereafter.
#[derive(Clone)]
pub struct KeyMaterial {
    signing: SigningKeypair,
    agreement: X25519StaticSecret,
}

impl KeyMaterial {
    /// Generate fresh signing and agreement keypairs from the OS random source.
    pub fn generate() -> Result<Self, CoreError> {
        let signing_seed = random_secret()?;
        let agreement_secret = random_secret()?;
        Ok(Self::from_secrets(&signing_seed, agreement_secret))
    }

    /// Rebuild from raw secret bytes.
    pub fn from_secrets(signing_seed: &[u8; 32], agreement_secret: [u8; 32]) -> Self {
        Self {
            signing: SigningKeypair::from_seed(signing_seed),
            agreement: X25519StaticSecret::from_bytes(agreement_secret),
        }
    }

    /// The signing keypair.
    pub fn signing(&self) -> &SigningKeypair {
        &self.signing
    }

    /// The agreement secret.
    pub fn agreement(&self) -> &X25519StaticSecret {
        &self.agreement
    }

    pub fn signing_public(&self) -> Ed25519PublicKey {
        self.signing.public_key()
    }

    pub fn agreement_public(&self) -> X25519PublicKey {
        self.agreement.public_key()
    }

    /// The identity's fingerprint.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.agreement_public())
    }

    /// Build the shareable identity card for this key material.
    pub fn public_identity(
        &self,
        agent_id: impl Into<String>,
        display_name: Option<String>,
    ) -> PublicIdentity {
        PublicIdentity {
            agent_id: agent_id.into(),
            fingerprint: self.fingerprint(),
            signing_public_key: self.signing_public(),
            agreement_public_key: self.agreement_public(),
            display_name,
        }
    }

    /// Encode for storage.
    pub fn to_stored(&self) -> StoredKeyMaterial {
        StoredKeyMaterial {
            signing_private_key: encoding::encode(&self.signing.seed()),
            signing_public_key: encoding::encode(self.signing_public().as_bytes()),
            agreement_private_key: encoding::encode(&self.agreement.to_bytes()),
            agreement_public_key: encoding::encode(self.agreement_public().as_bytes()),
        }
    }

    /// Decode from storage, checking the stored public halves.
    pub fn from_stored(stored: &StoredKeyMaterial) -> Result<Self, CoreError> {
        let signing_seed = encoding::decode_array::<32>(&stored.signing_private_key)?;
        let agreement_secret = encoding::decode_array::<32>(&stored.agreement_private_key)?;
        let keys = Self::from_secrets(&signing_seed, agreement_secret);

        let signing_public = encoding::decode_array::<32>(&stored.signing_public_key)?;
        let agreement_public = encoding::decode_array::<32>(&stored.agreement_public_key)?;
        if keys.signing_public().as_bytes() != &signing_public
            || keys.agreement_public().as_bytes() != &agreement_public
        {
            return Err(CoreError::InvalidKeyEncoding(
                "stored public key does not match private key".into(),
            ));
        }
        Ok(keys)
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial({})", self.fingerprint())
    }
}

/// At-rest form of [`KeyMaterial`]: raw key bytes as standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredKeyMaterial {
    pub signing_private_key: String,
    pub signing_public_key: String,
    pub agreement_private_key: String,
    pub agreement_public_key: String,
}

/// The public half of an identity, as published to the relay and kept in
/// contact books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIdentity {
    /// Relay handle.
    pub agent_id: String,
    pub fingerprint: Fingerprint,
    pub signing_public_key: Ed25519PublicKey,
    pub agreement_public_key: X25519PublicKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl PublicIdentity {
    /// Check the handle format and that the fingerprint belongs to the
    /// agreement key.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_agent_id(&self.agent_id)?;
        if !self.fingerprint.matches(&self.agreement_public_key) {
            return Err(CoreError::InvalidFingerprint(format!(
                "{} does not match agreement key of {}",
                self.fingerprint, self.agent_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_distinct_keys() {
        let a = KeyMaterial::generate().unwrap();
        let b = KeyMaterial::generate().unwrap();
        assert_ne!(a.signing_public(), b.signing_public());
        assert_ne!(a.agreement_public(), b.agreement_public());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.signing().seed(), [0u8; 32]);
        assert_ne!(a.agreement().to_bytes(), [0u8; 32]);
    }

    #[test]
    fn test_stored_roundtrip_is_byte_exact() {
        let keys = KeyMaterial::generate().unwrap();
        let stored = keys.to_stored();
        let json = serde_json::to_string(&stored).unwrap();
        let parsed: StoredKeyMaterial = serde_json::from_str(&json).unwrap();
        let recovered = KeyMaterial::from_stored(&parsed).unwrap();

        assert_eq!(recovered.signing().seed(), keys.signing().seed());
        assert_eq!(recovered.agreement().to_bytes(), keys.agreement().to_bytes());
        assert_eq!(recovered.fingerprint(), keys.fingerprint());
    }

    #[test]
    fn test_stored_mismatched_public_rejected() {
        let keys = KeyMaterial::generate().unwrap();
        let other = KeyMaterial::generate().unwrap();
        let mut stored = keys.to_stored();
        stored.agreement_public_key = other.to_stored().agreement_public_key;
        assert!(KeyMaterial::from_stored(&stored).is_err());
    }

    #[test]
    fn test_public_identity_validate() {
        let keys = KeyMaterial::from_secrets(&[1; 32], [2; 32]);
        let identity = keys.public_identity("alice", Some("Alice".into()));
        identity.validate().unwrap();

        let other = KeyMaterial::from_secrets(&[3; 32], [4; 32]);
        let mut forged = identity.clone();
        forged.agreement_public_key = other.agreement_public();
        assert!(forged.validate().is_err());
    }

    #[test]
    fn test_public_identity_json_shape() {
        let keys = KeyMaterial::from_secrets(&[1; 32], [2; 32]);
        let identity = keys.public_identity("alice", None);
        let value = serde_json::to_value(&identity).unwrap();
        assert!(value.get("agentId").is_some());
        assert!(value.get("signingPublicKey").is_some());
        assert!(value.get("displayName").is_none());
    }
}
