//! Message envelopes: the signed, versioned unit exchanged between agents.
//!
//! An envelope binds the sender identity, the addressed intents, and the
//! content under one Ed25519 signature. The signature is computed over the
//! canonical JSON of every other field, before the envelope is sealed for
//! the recipient, and is checked after it is opened.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::{Ed25519PublicKey, Ed25519Signature};
use crate::error::ValidationError;
use crate::fingerprint::Fingerprint;
use crate::identity::KeyMaterial;
use crate::signing;
use crate::types::{now_millis, validate_agent_id, IntentName, MessageId};

/// The current envelope schema version.
pub const ENVELOPE_VERSION: u8 = 1;

/// Maximum number of intents one envelope may address.
pub const MAX_INTENTS: usize = 16;

/// An intent as the sender saw it when sending: the name plus the
/// recipient's description at that time, kept for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntentSnapshot {
    pub name: IntentName,
    pub description: String,
}

impl IntentSnapshot {
    pub fn new(name: IntentName, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
        }
    }
}

/// Who sent an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SenderInfo {
    pub agent_id: String,
    pub fingerprint: Fingerprint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// How `Content::data` is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

/// The message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Content {
    pub format: ContentFormat,
    pub data: String,
    /// Optional note for a human reading along.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_message: Option<String>,
}

impl Content {
    /// Plain text content.
    pub fn text(data: impl Into<String>) -> Self {
        Self {
            format: ContentFormat::Text,
            data: data.into(),
            human_message: None,
        }
    }

    /// JSON content. The value is stored in its compact serialized form.
    pub fn json(value: &Value) -> Self {
        Self {
            format: ContentFormat::Json,
            data: value.to_string(),
            human_message: None,
        }
    }

    /// Attach a note for humans.
    pub fn with_human_message(mut self, message: impl Into<String>) -> Self {
        self.human_message = Some(message.into());
        self
    }

    /// Parse JSON data. Only meaningful for [`ContentFormat::Json`].
    pub fn json_value(&self) -> Result<Value, ValidationError> {
        Ok(serde_json::from_str(&self.data)?)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.format == ContentFormat::Json {
            self.json_value().map_err(|e| {
                ValidationError::Malformed(format!("json content does not parse: {}", e))
            })?;
        }
        Ok(())
    }
}

/// A signed message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MessageEnvelope {
    /// Schema version (currently 1).
    pub version: u8,

    pub message_id: MessageId,

    /// Sender-claimed send time (Unix milliseconds). Untrusted.
    pub timestamp: i64,

    /// Addressed intents, in the order the sender listed them.
    pub intents: Vec<IntentSnapshot>,

    pub sender: SenderInfo,

    pub content: Content,

    /// Ed25519 signature over the canonical JSON of all other fields.
    pub signature: Ed25519Signature,
}

impl MessageEnvelope {
    /// Names of the addressed intents.
    pub fn intent_names(&self) -> Vec<IntentName> {
        self.intents.iter().map(|i| i.name.clone()).collect()
    }

    /// The envelope as a JSON value.
    pub fn to_value(&self) -> Result<Value, ValidationError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Serialize to JSON bytes, ready for sealing.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ValidationError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Verify the signature against a known signing key.
    pub fn verify(&self, signer: &Ed25519PublicKey) -> bool {
        match self.to_value() {
            Ok(value) => signing::verify(&value, self.signature.as_bytes(), signer.as_bytes()),
            Err(_) => false,
        }
    }

    /// Structural checks that do not involve the signature.
    fn validate_structure(&self) -> Result<(), ValidationError> {
        if self.version != ENVELOPE_VERSION {
            return Err(ValidationError::UnsupportedVersion(self.version));
        }
        if self.intents.is_empty() {
            return Err(ValidationError::MissingIntents);
        }
        if self.intents.len() > MAX_INTENTS {
            return Err(ValidationError::Malformed(format!(
                "{} intents exceeds maximum of {}",
                self.intents.len(),
                MAX_INTENTS
            )));
        }
        validate_agent_id(&self.sender.agent_id)?;
        self.content.validate()
    }
}

/// Builder for signed envelopes.
pub struct EnvelopeBuilder {
    sender: SenderInfo,
    intents: Vec<IntentSnapshot>,
    content: Content,
    timestamp: Option<i64>,
    message_id: Option<MessageId>,
}

impl EnvelopeBuilder {
    /// Start building an envelope from the given sender.
    pub fn new(sender: SenderInfo) -> Self {
        Self {
            sender,
            intents: Vec::new(),
            content: Content::text(""),
            timestamp: None,
            message_id: None,
        }
    }

    /// Address an intent.
    pub fn intent(mut self, snapshot: IntentSnapshot) -> Self {
        self.intents.push(snapshot);
        self
    }

    /// Address several intents.
    pub fn intents(mut self, snapshots: impl IntoIterator<Item = IntentSnapshot>) -> Self {
        self.intents.extend(snapshots);
        self
    }

    /// Set the content.
    pub fn content(mut self, content: Content) -> Self {
        self.content = content;
        self
    }

    /// Set the timestamp (defaults to now).
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the message id (defaults to a fresh one).
    pub fn message_id(mut self, id: MessageId) -> Self {
        self.message_id = Some(id);
        self
    }

    /// Validate, sign with the sender's key material, and return the
    /// signed envelope.
    pub fn sign(self, keys: &KeyMaterial) -> Result<MessageEnvelope, ValidationError> {
        let expected = keys.fingerprint();
        if self.sender.fingerprint != expected {
            return Err(ValidationError::FingerprintMismatch {
                expected: expected.to_string(),
                actual: self.sender.fingerprint.to_string(),
            });
        }

        let timestamp = self.timestamp.unwrap_or_else(now_millis);
        let message_id = match self.message_id {
            Some(id) => id,
            None => MessageId::generate(&expected, timestamp)?,
        };

        let mut envelope = MessageEnvelope {
            version: ENVELOPE_VERSION,
            message_id,
            timestamp,
            intents: self.intents,
            sender: self.sender,
            content: self.content,
            signature: Ed25519Signature::ZERO,
        };
        envelope.validate_structure()?;

        let value = envelope.to_value()?;
        envelope.signature = signing::sign(&value, keys.signing())?;
        Ok(envelope)
    }
}

/// Build and sign an envelope in one call.
pub fn build_envelope(
    keys: &KeyMaterial,
    sender: SenderInfo,
    intents: Vec<IntentSnapshot>,
    content: Content,
) -> Result<MessageEnvelope, ValidationError> {
    EnvelopeBuilder::new(sender)
        .intents(intents)
        .content(content)
        .sign(keys)
}

/// Read the sender an envelope claims, without verifying anything.
///
/// Receivers use this only to pick the key to verify with; the result must
/// not be trusted until [`parse_and_verify`] succeeds.
pub fn read_claimed_sender(bytes: &[u8]) -> Result<SenderInfo, ValidationError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let sender = value
        .get("sender")
        .cloned()
        .ok_or_else(|| ValidationError::Malformed("missing sender".into()))?;
    Ok(serde_json::from_value(sender)?)
}

/// Parse an opened envelope and verify its signature.
///
/// The signature is checked over the received JSON itself (with the
/// `signature` member removed), not over a re-serialization, so envelopes
/// from other implementations verify byte-for-byte. An envelope that fails
/// verification is never returned.
pub fn parse_and_verify(
    bytes: &[u8],
    signer: &Ed25519PublicKey,
) -> Result<MessageEnvelope, ValidationError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let envelope: MessageEnvelope = serde_json::from_value(value.clone())?;
    envelope.validate_structure()?;

    if !signing::verify(&value, envelope.signature.as_bytes(), signer.as_bytes()) {
        return Err(ValidationError::SignatureFailed);
    }
    Ok(envelope)
}
