//! Strong type definitions for intentmail.
//!
//! Identifiers that cross a trust boundary are newtypes validated on
//! construction and on deserialization.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::crypto::fill_random;
use crate::error::CoreError;
use crate::fingerprint::Fingerprint;

/// Maximum length of an intent name.
pub const MAX_INTENT_NAME_LEN: usize = 64;

/// Maximum length of an agent id (handle).
pub const MAX_AGENT_ID_LEN: usize = 64;

/// Maximum length of a message id.
pub const MAX_MESSAGE_ID_LEN: usize = 128;

/// Name of the built-in intent every identity accepts.
pub const DEFAULT_INTENT: &str = "chat";

fn is_token(s: &str, max_len: usize) -> bool {
    !s.is_empty()
        && s.len() <= max_len
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// A validated intent name: `[A-Za-z0-9_-]+`, at most 64 characters.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IntentName(String);

impl IntentName {
    /// Parse and validate an intent name.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if !is_token(&name, MAX_INTENT_NAME_LEN) {
            return Err(CoreError::InvalidIntentName(name));
        }
        Ok(Self(name))
    }

    /// The built-in `chat` intent.
    pub fn chat() -> Self {
        Self(DEFAULT_INTENT.to_string())
    }

    /// Whether this is the built-in, non-removable intent.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_INTENT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for IntentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntentName({})", self.0)
    }
}

impl fmt::Display for IntentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for IntentName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IntentName {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for IntentName {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<IntentName> for String {
    fn from(name: IntentName) -> Self {
        name.0
    }
}

/// Check that an agent id (relay handle) is a non-empty token.
pub fn validate_agent_id(agent_id: &str) -> Result<(), CoreError> {
    if !is_token(agent_id, MAX_AGENT_ID_LEN) {
        return Err(CoreError::InvalidAgentId(agent_id.to_string()));
    }
    Ok(())
}

/// A globally unique message identifier.
///
/// Locally generated ids are 32 hex characters; ids from other
/// implementations are accepted if they are tokens of at most 128 characters.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageId(String);

impl MessageId {
    /// Generate a fresh id bound to the sender and send time.
    ///
    /// `blake3::derive_key("intentmail-v1-message-id", random || fingerprint || timestamp)`,
    /// truncated to 16 bytes.
    pub fn generate(sender: &Fingerprint, timestamp: i64) -> Result<Self, CoreError> {
        let mut nonce = [0u8; 16];
        fill_random(&mut nonce)?;

        let mut hasher = blake3::Hasher::new_derive_key("intentmail-v1-message-id");
        hasher.update(&nonce);
        hasher.update(sender.as_str().as_bytes());
        hasher.update(&timestamp.to_be_bytes());
        let hash = hasher.finalize();
        Ok(Self(hex::encode(&hash.as_bytes()[..16])))
    }

    /// Parse an id received from elsewhere.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !is_token(s, MAX_MESSAGE_ID_LEN) {
            return Err(CoreError::EncodingError(format!("invalid message id: {:?}", s)));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MessageId {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<MessageId> for String {
    fn from(id: MessageId) -> Self {
        id.0
    }
}

/// Get current time in milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
