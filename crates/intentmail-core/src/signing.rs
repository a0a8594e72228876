//! Signing and verification over canonical JSON.

use serde_json::Value;

use crate::canonical::signing_bytes;
use crate::crypto::{Ed25519PublicKey, Ed25519Signature, SigningKeypair};
use crate::error::CoreError;

/// Sign a message object.
///
/// The signature covers `canonicalize(message)` with any top-level
/// `signature` member removed.
pub fn sign(message: &Value, keypair: &SigningKeypair) -> Result<Ed25519Signature, CoreError> {
    let bytes = signing_bytes(message)?;
    Ok(keypair.sign(&bytes))
}

/// Verify a signature over a message object.
///
/// Returns `false` for every failure: malformed signature bytes, a key of
/// the wrong length or not on the curve, a non-canonicalizable message, or
/// a signature that does not match.
pub fn verify(message: &Value, signature: &[u8], public_key: &[u8]) -> bool {
    let Ok(signature) = <[u8; 64]>::try_from(signature) else {
        return false;
    };
    let Ok(public_key) = <[u8; 32]>::try_from(public_key) else {
        return false;
    };
    let Ok(bytes) = signing_bytes(message) else {
        return false;
    };

    Ed25519PublicKey::from_bytes(public_key)
        .verify(&bytes, &Ed25519Signature::from_bytes(signature))
        .is_ok()
}
