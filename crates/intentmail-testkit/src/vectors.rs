//! Golden test vectors for cross-implementation verification.
//!
//! Each vector fixes the secrets, a message, and the bytes any conforming
//! implementation must derive from them: the canonical signing bytes, the
//! deterministic Ed25519 signature over them, and the fingerprint.

use serde_json::Value;

use intentmail_core::{sign, signing_bytes, verify, KeyMaterial};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Ed25519 seed, every byte equal to this value.
    pub signing_seed: u8,
    /// X25519 secret, every byte equal to this value.
    pub agreement_secret: u8,
    /// Message as JSON text, possibly with a `signature` member.
    pub message: &'static str,
    /// Expected canonical signing bytes.
    pub expected_canonical: &'static str,
    /// Expected Ed25519 public key (hex).
    pub expected_signing_public: &'static str,
    /// Expected fingerprint of the agreement public key.
    pub expected_fingerprint: &'static str,
    /// Expected signature over the canonical bytes (hex).
    pub expected_signature: &'static str,
}

impl GoldenVector {
    pub fn keys(&self) -> KeyMaterial {
        KeyMaterial::from_secrets(&[self.signing_seed; 32], [self.agreement_secret; 32])
    }

    pub fn message_value(&self) -> Value {
        serde_json::from_str(self.message).expect("vector message is valid JSON")
    }
}

const ALICE_SIGNING_PUBLIC: &str =
    "2152f8d19b791d24453242e15f2eab6cb7cffa7b6a5ed30097960e069881db12";
const ALICE_FINGERPRINT: &str = "uCoSjoA5-M82EzzJdFalIg";

const BOB_SIGNING_PUBLIC: &str =
    "8a88e3dd7409f195fd52db2d3cba5d72ca6709bf1d94121bf3748801b40f6f5c";
const BOB_FINGERPRINT: &str = "z6VwxlO9ISsQqctVH9ehtA";

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "member order",
            signing_seed: 0x42,
            agreement_secret: 0x24,
            message: r#"{"c":3,"a":1,"b":2}"#,
            expected_canonical: r#"{"a":1,"b":2,"c":3}"#,
            expected_signing_public: ALICE_SIGNING_PUBLIC,
            expected_fingerprint: ALICE_FINGERPRINT,
            expected_signature: "7f899d585c7d3669a9038a5423f522b6eef2ef53cee5c9dc67ee2b586abc7dcd\
                                 aefc7621b7dfb5ab1b21d59d5646d7753f8b433f578943b806619b666d58030d",
        },
        GoldenVector {
            name: "nesting, escapes, and non-ASCII",
            signing_seed: 0x42,
            agreement_secret: 0x24,
            message: concat!(
                r#"{"z":{"y":[3,{"k":"v","a":null}],"x":true},"#,
                r#""text":"héllo \"quoted\"\n\t☃ \u0001","n":-42}"#
            ),
            expected_canonical: concat!(
                r#"{"n":-42,"text":"héllo \"quoted\"\n\t☃ \u0001","#,
                r#""z":{"x":true,"y":[3,{"a":null,"k":"v"}]}}"#
            ),
            expected_signing_public: ALICE_SIGNING_PUBLIC,
            expected_fingerprint: ALICE_FINGERPRINT,
            expected_signature: "85922694c90fa5959116a11eb59d11f64c121d77d4b969b20e79cbf5bbe02b21\
                                 160b0465fd08e5b1fbc0613d0398e531bb1e5a7c07ebed78ca45fca1697fae0c",
        },
        GoldenVector {
            name: "envelope with signature member",
            signing_seed: 0x42,
            agreement_secret: 0x24,
            message: concat!(
                r#"{"version":1,"messageId":"00112233445566778899aabbccddeeff","#,
                r#""timestamp":1736870400000,"#,
                r#""intents":[{"name":"chat","description":"General conversation"}],"#,
                r#""sender":{"agentId":"alice","fingerprint":"uCoSjoA5-M82EzzJdFalIg","#,
                r#""displayName":"Alice"},"#,
                r#""content":{"format":"text","data":"hello bob"},"signature":"ignored"}"#
            ),
            expected_canonical: concat!(
                r#"{"content":{"data":"hello bob","format":"text"},"#,
                r#""intents":[{"description":"General conversation","name":"chat"}],"#,
                r#""messageId":"00112233445566778899aabbccddeeff","#,
                r#""sender":{"agentId":"alice","displayName":"Alice","fingerprint":"uCoSjoA5-M82EzzJdFalIg"},"#,
                r#""timestamp":1736870400000,"version":1}"#
            ),
            expected_signing_public: ALICE_SIGNING_PUBLIC,
            expected_fingerprint: ALICE_FINGERPRINT,
            expected_signature: "33c41e7fd2f41f4c971eba8f2b04fe16c3637e3b944830677339891c45b06ba7\
                                 410ab0e3478783157d17ca56aa3cc1148f3a67fe48742741bb28e8e7151c0308",
        },
        GoldenVector {
            name: "member order, second key",
            signing_seed: 0x01,
            agreement_secret: 0x02,
            message: r#"{"c":3,"a":1,"b":2}"#,
            expected_canonical: r#"{"a":1,"b":2,"c":3}"#,
            expected_signing_public: BOB_SIGNING_PUBLIC,
            expected_fingerprint: BOB_FINGERPRINT,
            expected_signature: "26aa878ad1f79bcf774bf4411710806a52dda523d11398abca15fd0c4320a30f\
                                 c8a266c122f433fe09cf5882c7ca1f9559bab27ef0829dd51051d6f3075b4f03",
        },
        GoldenVector {
            name: "envelope, second key",
            signing_seed: 0x01,
            agreement_secret: 0x02,
            message: concat!(
                r#"{"version":1,"messageId":"00112233445566778899aabbccddeeff","#,
                r#""timestamp":1736870400000,"#,
                r#""intents":[{"name":"chat","description":"General conversation"}],"#,
                r#""sender":{"agentId":"alice","fingerprint":"z6VwxlO9ISsQqctVH9ehtA","#,
                r#""displayName":"Alice"},"#,
                r#""content":{"format":"text","data":"hello bob"},"signature":"ignored"}"#
            ),
            expected_canonical: concat!(
                r#"{"content":{"data":"hello bob","format":"text"},"#,
                r#""intents":[{"description":"General conversation","name":"chat"}],"#,
                r#""messageId":"00112233445566778899aabbccddeeff","#,
                r#""sender":{"agentId":"alice","displayName":"Alice","fingerprint":"z6VwxlO9ISsQqctVH9ehtA"},"#,
                r#""timestamp":1736870400000,"version":1}"#
            ),
            expected_signing_public: BOB_SIGNING_PUBLIC,
            expected_fingerprint: BOB_FINGERPRINT,
            expected_signature: "7e549658953b148abbb42cfdc094ad3a856cea4e0bc25ee58247275abad4df77\
                                 181553f3d8d5d5c1b9c7be29c33e1246222713110081d82304cc0d23c3d20507",
        },
    ]
}

/// Outcome of checking one vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorReport {
    pub name: String,
    pub canonical: String,
    pub fingerprint: String,
    pub signature: String,
    pub matches: bool,
}

/// Derive everything a vector pins down and compare with the expectations.
pub fn check_vector(vector: &GoldenVector) -> VectorReport {
    let keys = vector.keys();
    let message = vector.message_value();

    let canonical = signing_bytes(&message)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();
    let signature = sign(&message, keys.signing())
        .map(|sig| hex::encode(sig.as_bytes()))
        .unwrap_or_default();
    let fingerprint = keys.fingerprint().to_string();

    let expected_signature = hex::decode(vector.expected_signature).unwrap_or_default();
    let matches = canonical == vector.expected_canonical
        && fingerprint == vector.expected_fingerprint
        && keys.signing_public().to_hex() == vector.expected_signing_public
        && signature == vector.expected_signature
        && verify(&message, &expected_signature, keys.signing_public().as_bytes());

    VectorReport {
        name: vector.name.to_string(),
        canonical,
        fingerprint,
        signature,
        matches,
    }
}

/// Check every golden vector.
pub fn verify_all_vectors() -> Vec<VectorReport> {
    all_vectors().iter().map(check_vector).collect()
}
