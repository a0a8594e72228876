//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Value};

use intentmail_core::{
    Content, EnvelopeBuilder, Fingerprint, IntentName, IntentSnapshot, KeyMaterial,
    MessageEnvelope, MessageId, SenderInfo,
};

/// Generate key material from random secrets.
pub fn key_material() -> impl Strategy<Value = KeyMaterial> {
    (any::<[u8; 32]>(), any::<[u8; 32]>())
        .prop_map(|(seed, agreement)| KeyMaterial::from_secrets(&seed, agreement))
}

/// Generate a fingerprint of a random agreement key.
pub fn fingerprint() -> impl Strategy<Value = Fingerprint> {
    any::<[u8; 32]>().prop_map(|key| intentmail_core::fingerprint(&key))
}

/// Generate a valid intent name.
pub fn intent_name() -> impl Strategy<Value = IntentName> {
    "[a-z][a-z0-9_-]{0,15}"
        .prop_map(|s| IntentName::new(s).expect("pattern matches token charset"))
}

/// Generate a valid agent id.
pub fn agent_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}".prop_map(String::from)
}

/// Generate a message id in the generated 32-hex-character form.
pub fn message_id() -> impl Strategy<Value = MessageId> {
    any::<[u8; 16]>()
        .prop_map(|bytes| MessageId::parse(&hex::encode(bytes)).expect("hex is a valid token"))
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=4_102_444_800_000i64
}

/// Generate a JSON value with integer numbers only, nested a few levels.
pub fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<String>().prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::btree_map(any::<String>(), inner, 0..8)
                .prop_map(|members| Value::Object(members.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Generate a JSON object.
pub fn json_object() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-zA-Z_]{1,8}", json_value(), 0..8)
        .prop_map(|members| Value::Object(members.into_iter().collect()))
}

/// Generate message content in any format.
pub fn content() -> impl Strategy<Value = Content> {
    prop_oneof![
        any::<String>().prop_map(Content::text),
        json_value().prop_map(|v| Content::json(&v)),
        any::<String>().prop_map(|s| Content::text(s).with_human_message("generated")),
    ]
}

/// Parameters for generating a signed envelope.
#[derive(Debug, Clone)]
pub struct EnvelopeParams {
    pub keys: KeyMaterial,
    pub agent_id: String,
    pub intents: Vec<IntentName>,
    pub content: Content,
    pub timestamp: i64,
    pub message_id: MessageId,
}

impl Arbitrary for EnvelopeParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            key_material(),
            agent_id(),
            prop::collection::vec(intent_name(), 1..4),
            content(),
            timestamp(),
            message_id(),
        )
            .prop_map(
                |(keys, agent_id, intents, content, timestamp, message_id)| EnvelopeParams {
                    keys,
                    agent_id,
                    intents,
                    content,
                    timestamp,
                    message_id,
                },
            )
            .boxed()
    }
}

/// Build and sign an envelope from parameters.
pub fn envelope_from_params(params: &EnvelopeParams) -> MessageEnvelope {
    let sender = SenderInfo {
        agent_id: params.agent_id.clone(),
        fingerprint: params.keys.fingerprint(),
        display_name: None,
    };
    EnvelopeBuilder::new(sender)
        .intents(
            params
                .intents
                .iter()
                .map(|name| IntentSnapshot::new(name.clone(), format!("{name} intent"))),
        )
        .content(params.content.clone())
        .timestamp(params.timestamp)
        .message_id(params.message_id.clone())
        .sign(&params.keys)
        .expect("generated envelope is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use intentmail_core::{canonicalize, parse_and_verify};

    proptest! {
        #[test]
        fn test_generated_envelopes_verify(params: EnvelopeParams) {
            let envelope = envelope_from_params(&params);
            let bytes = envelope.to_bytes().unwrap();
            let parsed = parse_and_verify(&bytes, &params.keys.signing_public()).unwrap();
            prop_assert_eq!(parsed, envelope);
        }

        #[test]
        fn test_signature_is_deterministic(params: EnvelopeParams) {
            let a = envelope_from_params(&params);
            let b = envelope_from_params(&params);
            prop_assert_eq!(a.signature, b.signature);
            prop_assert_eq!(a.to_bytes().unwrap(), b.to_bytes().unwrap());
        }

        #[test]
        fn test_generated_json_canonicalizes(value in json_value()) {
            let bytes = canonicalize(&value).unwrap();
            let reparsed: Value = serde_json::from_slice(&bytes).unwrap();
            prop_assert_eq!(reparsed, value);
        }
    }
}
