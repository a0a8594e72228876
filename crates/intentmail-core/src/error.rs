//! Error types for intentmail core.

use thiserror::Error;

/// Core errors that can occur while handling keys, fingerprints, and
/// canonical encodings.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The OS random source failed. Fatal; never retried.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("invalid intent name: {0:?}")]
    InvalidIntentName(String),

    #[error("invalid agent id: {0:?}")]
    InvalidAgentId(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("encoding error: {0}")]
    EncodingError(String),
}

/// Validation errors for signed message envelopes.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("signature verification failed")]
    SignatureFailed,

    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u8),

    #[error("malformed envelope: {0}")]
    Malformed(String),

    #[error("sender fingerprint mismatch: expected {expected}, got {actual}")]
    FingerprintMismatch { expected: String, actual: String },

    #[error("envelope must address at least one intent")]
    MissingIntents,

    /// The OS random source failed while assigning a message id.
    #[error("random source failed: {0}")]
    RandomSource(String),
}

impl From<CoreError> for ValidationError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidSignature | CoreError::InvalidPublicKey => {
                ValidationError::SignatureFailed
            }
            CoreError::KeyGeneration(reason) => ValidationError::RandomSource(reason),
            other => ValidationError::Malformed(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(e: serde_json::Error) -> Self {
        ValidationError::Malformed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_source_failure_is_not_reported_as_malformed() {
        let err = ValidationError::from(CoreError::KeyGeneration("no entropy".into()));
        assert!(matches!(err, ValidationError::RandomSource(ref r) if r == "no entropy"));

        let err = ValidationError::from(CoreError::InvalidSignature);
        assert!(matches!(err, ValidationError::SignatureFailed));
    }
}
