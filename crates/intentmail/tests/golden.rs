//! Golden test vectors for cross-implementation verification.
//!
//! Every implementation of intentmail must produce identical:
//! - signing bytes (canonical JSON without the `signature` member)
//! - signature (deterministic Ed25519)
//! - fingerprint

use intentmail::core::{
    signing_bytes, sign, verify, Content, EnvelopeBuilder, IntentName, IntentSnapshot,
    KeyMaterial, MessageId, SenderInfo,
};
use serde_json::Value;

struct Vector {
    name: &'static str,
    seed: u8,
    agreement: u8,
    message: &'static str,
    signing_bytes: &'static str,
    signing_public: &'static str,
    fingerprint: &'static str,
    signature: &'static str,
}

const ENVELOPE_SIGNING_BYTES: &str = concat!(
    r#"{"content":{"data":"hello bob","format":"text"},"#,
    r#""intents":[{"description":"General conversation","name":"chat"}],"#,
    r#""messageId":"00112233445566778899aabbccddeeff","#,
    r#""sender":{"agentId":"alice","displayName":"Alice","fingerprint":"uCoSjoA5-M82EzzJdFalIg"},"#,
    r#""timestamp":1736870400000,"version":1}"#
);

const ENVELOPE_SIGNATURE: &str = concat!(
    "33c41e7fd2f41f4c971eba8f2b04fe16c3637e3b944830677339891c45b06ba7",
    "410ab0e3478783157d17ca56aa3cc1148f3a67fe48742741bb28e8e7151c0308"
);

fn vectors() -> Vec<Vector> {
    vec![
        Vector {
            name: "sorted members",
            seed: 0x42,
            agreement: 0x24,
            message: r#"{"c":3,"a":1,"b":2}"#,
            signing_bytes: r#"{"a":1,"b":2,"c":3}"#,
            signing_public: "2152f8d19b791d24453242e15f2eab6cb7cffa7b6a5ed30097960e069881db12",
            fingerprint: "uCoSjoA5-M82EzzJdFalIg",
            signature: concat!(
                "7f899d585c7d3669a9038a5423f522b6eef2ef53cee5c9dc67ee2b586abc7dcd",
                "aefc7621b7dfb5ab1b21d59d5646d7753f8b433f578943b806619b666d58030d"
            ),
        },
        Vector {
            name: "nested with escapes",
            seed: 0x42,
            agreement: 0x24,
            message: r#"{"z":{"y":[3,{"k":"v","a":null}],"x":true},"text":"héllo \"quoted\"\n\t☃ \u0001","n":-42}"#,
            signing_bytes: r#"{"n":-42,"text":"héllo \"quoted\"\n\t☃ \u0001","z":{"x":true,"y":[3,{"a":null,"k":"v"}]}}"#,
            signing_public: "2152f8d19b791d24453242e15f2eab6cb7cffa7b6a5ed30097960e069881db12",
            fingerprint: "uCoSjoA5-M82EzzJdFalIg",
            signature: concat!(
                "85922694c90fa5959116a11eb59d11f64c121d77d4b969b20e79cbf5bbe02b21",
                "160b0465fd08e5b1fbc0613d0398e531bb1e5a7c07ebed78ca45fca1697fae0c"
            ),
        },
        Vector {
            name: "sorted members, second key",
            seed: 0x01,
            agreement: 0x02,
            message: r#"{"c":3,"a":1,"b":2}"#,
            signing_bytes: r#"{"a":1,"b":2,"c":3}"#,
            signing_public: "8a88e3dd7409f195fd52db2d3cba5d72ca6709bf1d94121bf3748801b40f6f5c",
            fingerprint: "z6VwxlO9ISsQqctVH9ehtA",
            signature: concat!(
                "26aa878ad1f79bcf774bf4411710806a52dda523d11398abca15fd0c4320a30f",
                "c8a266c122f433fe09cf5882c7ca1f9559bab27ef0829dd51051d6f3075b4f03"
            ),
        },
    ]
}

#[test]
fn golden_vectors_match() {
    for v in vectors() {
        let keys = KeyMaterial::from_secrets(&[v.seed; 32], [v.agreement; 32]);
        let message: Value = serde_json::from_str(v.message).unwrap();

        let bytes = signing_bytes(&message).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), v.signing_bytes, "{}", v.name);
        assert_eq!(keys.signing_public().to_hex(), v.signing_public, "{}", v.name);
        assert_eq!(keys.fingerprint().as_str(), v.fingerprint, "{}", v.name);

        let signature = sign(&message, keys.signing()).unwrap();
        assert_eq!(signature.to_hex(), v.signature, "{}", v.name);
        assert!(verify(&message, signature.as_bytes(), keys.signing_public().as_bytes()));
    }
}

#[test]
fn golden_envelope() {
    let keys = KeyMaterial::from_secrets(&[0x42; 32], [0x24; 32]);
    let sender = SenderInfo {
        agent_id: "alice".into(),
        fingerprint: keys.fingerprint(),
        display_name: Some("Alice".into()),
    };

    let envelope = EnvelopeBuilder::new(sender)
        .intent(IntentSnapshot::new(IntentName::chat(), "General conversation"))
        .content(Content::text("hello bob"))
        .timestamp(1_736_870_400_000)
        .message_id(MessageId::parse("00112233445566778899aabbccddeeff").unwrap())
        .sign(&keys)
        .unwrap();

    let value = envelope.to_value().unwrap();
    let bytes = signing_bytes(&value).unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), ENVELOPE_SIGNING_BYTES);
    assert_eq!(envelope.signature.to_hex(), ENVELOPE_SIGNATURE);
    assert!(envelope.verify(&keys.signing_public()));
}

#[test]
fn golden_envelope_member_order_does_not_matter() {
    // A peer may serialize members in any order; the signature still holds.
    let keys = KeyMaterial::from_secrets(&[0x42; 32], [0x24; 32]);
    let wire = concat!(
        r#"{"signature":"ignored","version":1,"timestamp":1736870400000,"#,
        r#""sender":{"fingerprint":"uCoSjoA5-M82EzzJdFalIg","displayName":"Alice","agentId":"alice"},"#,
        r#""messageId":"00112233445566778899aabbccddeeff","#,
        r#""intents":[{"name":"chat","description":"General conversation"}],"#,
        r#""content":{"format":"text","data":"hello bob"}}"#
    );
    let message: Value = serde_json::from_str(wire).unwrap();
    let signature = sign(&message, keys.signing()).unwrap();
    assert_eq!(signature.to_hex(), ENVELOPE_SIGNATURE);
}
