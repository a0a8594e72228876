//! Error types for the agent.

use intentmail_core::{CoreError, ValidationError};
use intentmail_perms::PermsError;
use intentmail_store::StoreError;
use thiserror::Error;

use crate::relay::RelayError;

/// Errors that can occur during agent operations.
///
/// Authorization denials are not errors; they come back as
/// [`SendOutcome::Denied`](crate::SendOutcome::Denied).
#[derive(Debug, Error)]
pub enum AgentError {
    /// Key or encoding error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Envelope failed validation or signature verification.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Intent, grant, or encryption error.
    #[error("permission error: {0}")]
    Permission(#[from] PermsError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Relay error.
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),

    /// Caller supplied something unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No identity is known for the handle, locally or on the relay.
    #[error("unknown recipient: {0}")]
    UnknownRecipient(String),

    /// A received envelope claims a sender nobody knows.
    #[error("unknown sender: {0}")]
    UnknownSender(String),

    /// A received envelope names a sender whose keys do not match the
    /// identity on record.
    #[error("identity mismatch for {agent_id}: {reason}")]
    IdentityMismatch { agent_id: String, reason: String },

    /// A received envelope carries intents this identity never allowed the
    /// sender to use.
    #[error("sender {sender} is not allowed intents: {}", .blocked.join(", "))]
    IntentsNotAllowed { sender: String, blocked: Vec<String> },
}

impl AgentError {
    /// Whether this error means a message was corrupted, forged, or
    /// encrypted to someone else, as opposed to a storage or transport
    /// fault.
    pub fn is_crypto_failure(&self) -> bool {
        matches!(
            self,
            AgentError::Validation(
                ValidationError::SignatureFailed | ValidationError::FingerprintMismatch { .. }
            ) | AgentError::Permission(PermsError::DecryptionError(_))
                | AgentError::IdentityMismatch { .. }
        )
    }
}

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_failure_classification() {
        assert!(AgentError::from(ValidationError::SignatureFailed).is_crypto_failure());
        assert!(AgentError::from(PermsError::DecryptionError("tag".into())).is_crypto_failure());
        assert!(AgentError::IdentityMismatch {
            agent_id: "bob".into(),
            reason: "fingerprint".into()
        }
        .is_crypto_failure());

        assert!(!AgentError::UnknownRecipient("bob".into()).is_crypto_failure());
        assert!(!AgentError::from(StoreError::Task("gone".into())).is_crypto_failure());
        assert!(!AgentError::from(ValidationError::MissingIntents).is_crypto_failure());
    }

    #[test]
    fn test_intents_not_allowed_message() {
        let err = AgentError::IntentsNotAllowed {
            sender: "mallory".into(),
            blocked: vec!["admin".into(), "billing".into()],
        };
        assert_eq!(
            err.to_string(),
            "sender mallory is not allowed intents: admin, billing"
        );
    }
}
