//! # intentmail Core
//!
//! Pure primitives for intentmail: agent key material, fingerprints,
//! canonical JSON, signatures, and signed message envelopes.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`KeyMaterial`] - Ed25519 signing + X25519 agreement keys of one identity
//! - [`Fingerprint`] - Stable identity label derived from the agreement key
//! - [`MessageEnvelope`] - The signed, versioned message exchanged between agents
//! - [`IntentName`] - Validated intent token
//!
//! ## Canonicalization
//!
//! Signatures cover canonical JSON (sorted members, no whitespace). See
//! the [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod encoding;
pub mod envelope;
pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod signing;
pub mod types;

pub use canonical::{canonicalize, canonicalize_serializable, signing_bytes};
pub use crypto::{
    Ed25519PublicKey, Ed25519Signature, SigningKeypair, X25519PublicKey, X25519StaticSecret,
};
pub use envelope::{
    build_envelope, parse_and_verify, read_claimed_sender, Content, ContentFormat,
    EnvelopeBuilder, IntentSnapshot, MessageEnvelope, SenderInfo, ENVELOPE_VERSION,
};
pub use error::{CoreError, ValidationError};
pub use fingerprint::{fingerprint, Fingerprint};
pub use identity::{KeyMaterial, PublicIdentity, StoredKeyMaterial};
pub use signing::{sign, verify};
pub use types::{now_millis, validate_agent_id, IntentName, MessageId, DEFAULT_INTENT};
