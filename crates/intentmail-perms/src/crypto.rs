//! Cryptographic utilities for sealing messages.
//!
//! Provides ephemeral X25519 key agreement, HKDF-SHA256 key derivation, and
//! ChaCha20-Poly1305 authenticated encryption.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use intentmail_core::{X25519PublicKey, X25519StaticSecret};

use crate::error::{PermsError, Result};

const SEAL_KEY_INFO: &[u8] = b"intentmail-seal-v1-key";
const SEAL_NONCE_INFO: &[u8] = b"intentmail-seal-v1-nonce";

/// Length of the Poly1305 authentication tag appended to ciphertexts.
pub const TAG_LEN: usize = 16;

/// A shared secret derived from X25519 key agreement.
#[derive(Clone)]
pub struct SharedKey([u8; 32]);

impl SharedKey {
    /// Agree on a shared secret using a static secret.
    pub fn agree(secret: &X25519StaticSecret, peer_public: &X25519PublicKey) -> Self {
        Self(secret.diffie_hellman(peer_public))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether the peer key was a low-order point (all-zero output).
    pub fn is_degenerate(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Derive the per-message key and nonce for a sealed envelope.
    ///
    /// HKDF-SHA256 with salt `ephemeral_public || recipient_public`. Each
    /// ephemeral key is used for exactly one message, so the derived
    /// (key, nonce) pair never repeats.
    pub fn derive_seal_keys(
        &self,
        ephemeral_public: &X25519PublicKey,
        recipient_public: &X25519PublicKey,
    ) -> Result<(EncryptionKey, EncryptionNonce)> {
        let mut salt = [0u8; 64];
        salt[..32].copy_from_slice(ephemeral_public.as_bytes());
        salt[32..].copy_from_slice(recipient_public.as_bytes());

        let hk = Hkdf::<Sha256>::new(Some(&salt), &self.0);

        let mut key = [0u8; 32];
        hk.expand(SEAL_KEY_INFO, &mut key)
            .map_err(|e| PermsError::KeyDerivationError(e.to_string()))?;

        let mut nonce = [0u8; 12];
        hk.expand(SEAL_NONCE_INFO, &mut nonce)
            .map_err(|e| PermsError::KeyDerivationError(e.to_string()))?;

        Ok((EncryptionKey(key), EncryptionNonce(nonce)))
    }
}

/// A 256-bit symmetric encryption key for ChaCha20-Poly1305.
#[derive(Clone)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encrypt data with this key. The output carries the 16-byte tag.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        nonce: &EncryptionNonce,
        aad: &[u8],
    ) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| PermsError::EncryptionError(e.to_string()))?;

        cipher
            .encrypt(
                Nonce::from_slice(&nonce.0),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|e| PermsError::EncryptionError(e.to_string()))
    }

    /// Decrypt and authenticate data with this key.
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        nonce: &EncryptionNonce,
        aad: &[u8],
    ) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| PermsError::DecryptionError(e.to_string()))?;

        cipher
            .decrypt(
                Nonce::from_slice(&nonce.0),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| PermsError::DecryptionError("authentication failed".into()))
    }
}

/// A 96-bit nonce for ChaCha20-Poly1305.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionNonce([u8; 12]);

impl EncryptionNonce {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

/// Ephemeral key pair for one-time key agreement.
pub struct EphemeralKeyPair {
    secret: X25519StaticSecret,
    public: X25519PublicKey,
}

impl EphemeralKeyPair {
    /// Generate a new ephemeral key pair from the OS random source.
    pub fn generate() -> Result<Self> {
        Ok(Self::from_secret(X25519StaticSecret::generate()?))
    }

    /// Generate a new ephemeral key pair from `rng`.
    pub fn generate_with<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self> {
        Ok(Self::from_secret(X25519StaticSecret::generate_with(rng)?))
    }

    fn from_secret(secret: X25519StaticSecret) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Get the public key.
    pub fn public_key(&self) -> X25519PublicKey {
        self.public
    }

    /// Perform key agreement with a peer's public key.
    ///
    /// Consumes the ephemeral secret (can only be used once).
    pub fn diffie_hellman(self, peer_public: &X25519PublicKey) -> SharedKey {
        SharedKey::agree(&self.secret, peer_public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_secret(fill: u8) -> X25519StaticSecret {
        X25519StaticSecret::from_bytes([fill; 32])
    }

    #[test]
    fn test_ephemeral_key_agreement() {
        let bob = static_secret(0x11);
        let bob_public = bob.public_key();

        let ephemeral = EphemeralKeyPair::generate().unwrap();
        let ephemeral_public = ephemeral.public_key();
        let alice_shared = ephemeral.diffie_hellman(&bob_public);

        let bob_shared = SharedKey::agree(&bob, &ephemeral_public);

        assert_eq!(alice_shared.as_bytes(), bob_shared.as_bytes());
    }

    #[test]
    fn test_seal_key_derivation_deterministic() {
        let shared = SharedKey([0x42; 32]);
        let e = X25519PublicKey::from_bytes([1; 32]);
        let r = X25519PublicKey::from_bytes([2; 32]);

        let (k1, n1) = shared.derive_seal_keys(&e, &r).unwrap();
        let (k2, n2) = shared.derive_seal_keys(&e, &r).unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());
        assert_eq!(n1, n2);
    }

    #[test]
    fn test_seal_key_derivation_bound_to_public_keys() {
        let shared = SharedKey([0x42; 32]);
        let e = X25519PublicKey::from_bytes([1; 32]);
        let r = X25519PublicKey::from_bytes([2; 32]);

        let (k1, _) = shared.derive_seal_keys(&e, &r).unwrap();
        let (k2, _) = shared.derive_seal_keys(&r, &e).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
        assert_ne!(k1.as_bytes(), shared.as_bytes());
    }

    #[test]
    fn test_encrypt_decrypt_with_aad() {
        let key = EncryptionKey::from_bytes([7; 32]);
        let nonce = EncryptionNonce::from_bytes([9; 12]);

        let ciphertext = key.encrypt(b"hello, world!", &nonce, b"aad").unwrap();
        assert_eq!(ciphertext.len(), 13 + TAG_LEN);

        assert_eq!(key.decrypt(&ciphertext, &nonce, b"aad").unwrap(), b"hello, world!");
        assert!(key.decrypt(&ciphertext, &nonce, b"other").is_err());
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let key1 = EncryptionKey::from_bytes([1; 32]);
        let key2 = EncryptionKey::from_bytes([2; 32]);
        let nonce = EncryptionNonce::from_bytes([0; 12]);

        let ciphertext = key1.encrypt(b"secret", &nonce, &[]).unwrap();
        assert!(matches!(
            key2.decrypt(&ciphertext, &nonce, &[]),
            Err(PermsError::DecryptionError(_))
        ));
    }

    #[test]
    fn test_ephemeral_generation_reports_failing_random_source() {
        struct FailingRng;

        impl RngCore for FailingRng {
            fn next_u32(&mut self) -> u32 {
                0
            }

            fn next_u64(&mut self) -> u64 {
                0
            }

            fn fill_bytes(&mut self, dest: &mut [u8]) {
                dest.fill(0);
            }

            fn try_fill_bytes(
                &mut self,
                _dest: &mut [u8],
            ) -> std::result::Result<(), rand::Error> {
                Err(rand::Error::new(std::io::Error::other("entropy unavailable")))
            }
        }

        assert!(matches!(
            EphemeralKeyPair::generate_with(&mut FailingRng),
            Err(PermsError::CoreError(intentmail_core::CoreError::KeyGeneration(_)))
        ));
    }

    #[test]
    fn test_low_order_point_is_degenerate() {
        let shared = SharedKey::agree(&static_secret(0x33), &X25519PublicKey::from_bytes([0; 32]));
        assert!(shared.is_degenerate());
    }
}
