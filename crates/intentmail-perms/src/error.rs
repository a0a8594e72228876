//! Error types for the permissions module.

use thiserror::Error;

/// Errors that can occur during intent, grant, and encryption operations.
#[derive(Debug, Error)]
pub enum PermsError {
    /// The built-in intent cannot be removed or privileged.
    #[error("intent {0:?} is reserved")]
    ReservedIntent(String),

    /// Intent name is not a valid token.
    #[error("invalid intent name: {0}")]
    InvalidIntentName(String),

    /// Intent not declared.
    #[error("intent not found: {0}")]
    IntentNotFound(String),

    /// Malformed authorization request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Encryption error.
    #[error("encryption error: {0}")]
    EncryptionError(String),

    /// Decryption error. Never accompanied by partial plaintext.
    #[error("decryption error: {0}")]
    DecryptionError(String),

    /// Key derivation error.
    #[error("key derivation error: {0}")]
    KeyDerivationError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Core error.
    #[error("core error: {0}")]
    CoreError(#[from] intentmail_core::CoreError),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
