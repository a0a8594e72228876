//! Base64 text encodings for key material and signatures.
//!
//! Keys and signatures travel as standard base64 (padded) both on the wire
//! and at rest. Fingerprints use the URL-safe alphabet without padding.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::error::CoreError;

/// Encode bytes as standard base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64.
pub fn decode(s: &str) -> Result<Vec<u8>, CoreError> {
    STANDARD
        .decode(s)
        .map_err(|e| CoreError::InvalidKeyEncoding(e.to_string()))
}

/// Decode standard base64 into a fixed-length array.
pub fn decode_array<const N: usize>(s: &str) -> Result<[u8; N], CoreError> {
    let bytes = decode(s)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        CoreError::InvalidKeyEncoding(format!("expected {} bytes, got {}", N, len))
    })
}

/// Encode bytes as URL-safe base64 without padding.
pub fn encode_url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode URL-safe base64 without padding.
pub fn decode_url(s: &str) -> Result<Vec<u8>, CoreError> {
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|e| CoreError::InvalidKeyEncoding(e.to_string()))
}

/// Implements `Serialize`/`Deserialize` as a base64 string for a
/// fixed-size byte newtype with `from_bytes` and `as_bytes`.
macro_rules! base64_serde {
    ($ty:ty, $len:expr) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(&$crate::encoding::encode(self.as_bytes()))
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s = <String as serde::Deserialize>::deserialize(d)?;
                let bytes = $crate::encoding::decode_array::<$len>(&s)
                    .map_err(serde::de::Error::custom)?;
                Ok(Self::from_bytes(bytes))
            }
        }
    };
}

pub(crate) use base64_serde;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_array_length_checked() {
        let s = encode(&[1u8; 31]);
        assert!(decode_array::<32>(&s).is_err());

        let s = encode(&[1u8; 32]);
        assert_eq!(decode_array::<32>(&s).unwrap(), [1u8; 32]);
    }

    #[test]
    fn test_url_encoding_has_no_padding() {
        let s = encode_url(&[0xff; 16]);
        assert_eq!(s.len(), 22);
        assert!(!s.contains('='));
        assert!(!s.contains('+') && !s.contains('/'));
        assert_eq!(decode_url(&s).unwrap(), vec![0xff; 16]);
    }
}
