//! Canonical JSON encoding for deterministic signing.
//!
//! The canonical form follows RFC 8785 (JCS) for the values intentmail uses:
//! - Object members sorted by key, compared as UTF-16 code units, at every depth
//! - No insignificant whitespace
//! - Strings escaped exactly as ECMAScript `JSON.stringify` does
//! - Integers only (timestamps are i64 milliseconds); other numbers are rejected
//!
//! Two implementations given the same logical message must produce
//! identical bytes, otherwise signatures stop verifying across them.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Name of the member excluded from the signed bytes.
pub const SIGNATURE_FIELD: &str = "signature";

/// Encode a JSON value to canonical bytes.
pub fn canonicalize(value: &Value) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value)?;
    Ok(buf)
}

/// Encode any serializable message to canonical bytes.
pub fn canonicalize_serializable<T: Serialize>(message: &T) -> Result<Vec<u8>, CoreError> {
    let value =
        serde_json::to_value(message).map_err(|e| CoreError::Canonicalization(e.to_string()))?;
    canonicalize(&value)
}

/// The bytes a signature covers: the canonical form of `message` with its
/// top-level `signature` member removed.
///
/// Used identically when signing and when verifying.
pub fn signing_bytes(message: &Value) -> Result<Vec<u8>, CoreError> {
    match message {
        Value::Object(map) if map.contains_key(SIGNATURE_FIELD) => {
            let mut stripped = map.clone();
            stripped.remove(SIGNATURE_FIELD);
            let mut buf = Vec::new();
            encode_object(&mut buf, &stripped)?;
            Ok(buf)
        }
        Value::Object(_) => canonicalize(message),
        _ => Err(CoreError::Canonicalization(
            "signed messages must be JSON objects".into(),
        )),
    }
}

/// Recursively encode a JSON value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Null => buf.extend_from_slice(b"null"),
        Value::Bool(true) => buf.extend_from_slice(b"true"),
        Value::Bool(false) => buf.extend_from_slice(b"false"),
        Value::Number(n) => encode_number(buf, n)?,
        Value::String(s) => encode_string(buf, s)?,
        Value::Array(items) => {
            buf.push(b'[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    buf.push(b',');
                }
                encode_value_to(buf, item)?;
            }
            buf.push(b']');
        }
        Value::Object(map) => encode_object(buf, map)?,
    }
    Ok(())
}

/// Encode an object with members sorted by UTF-16 code units of the key.
fn encode_object(buf: &mut Vec<u8>, map: &Map<String, Value>) -> Result<(), CoreError> {
    let mut members: Vec<(&String, &Value)> = map.iter().collect();
    members.sort_by(|a, b| a.0.encode_utf16().cmp(b.0.encode_utf16()));

    buf.push(b'{');
    for (idx, (key, value)) in members.into_iter().enumerate() {
        if idx > 0 {
            buf.push(b',');
        }
        encode_string(buf, key)?;
        buf.push(b':');
        encode_value_to(buf, value)?;
    }
    buf.push(b'}');
    Ok(())
}

fn encode_number(buf: &mut Vec<u8>, n: &serde_json::Number) -> Result<(), CoreError> {
    if let Some(i) = n.as_i64() {
        buf.extend_from_slice(i.to_string().as_bytes());
        return Ok(());
    }
    if let Some(u) = n.as_u64() {
        buf.extend_from_slice(u.to_string().as_bytes());
        return Ok(());
    }
    Err(CoreError::Canonicalization(format!(
        "non-integer number {} has no canonical form",
        n
    )))
}

/// serde_json escapes `"`, `\`, and control characters with the same short
/// forms and lowercase `\u00XX` escapes as `JSON.stringify`, and leaves all
/// other characters (including non-ASCII) verbatim.
fn encode_string(buf: &mut Vec<u8>, s: &str) -> Result<(), CoreError> {
    serde_json::to_writer(&mut *buf, s).map_err(|e| CoreError::Canonicalization(e.to_string()))
}
