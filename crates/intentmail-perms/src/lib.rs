//! # intentmail Permissions
//!
//! Intents, permission grants, authorization, and sealed message encryption.
//!
//! ## Overview
//!
//! Every identity declares the intents it accepts. Public intents are open
//! to any sender; privileged intents need a grant from the owner to the
//! sender. The authorization decision lives in one place,
//! [`IntentDirectory::authorize`], and both the sending agent and the relay
//! run it.
//!
//! ## Key Concepts
//!
//! - **Intent**: a named message purpose; `chat` always exists and is public
//! - **Grant**: `(owner, grantee, intent)`, recorded in the owner's directory
//! - **IntentRegistry**: the lock-guarded, per-identity directory
//! - **SealedEnvelope**: a signed envelope encrypted to the recipient
//!
//! ## Encryption Model
//!
//! Each message uses a fresh X25519 ephemeral key. The shared secret with the
//! recipient's agreement key is expanded with HKDF-SHA256 into a
//! ChaCha20-Poly1305 key and nonce. Tampering is detected on open.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use intentmail_core::{fingerprint, IntentName, X25519StaticSecret};
//! use intentmail_perms::{IntentDirectory, SealedEnvelope};
//!
//! let mut directory = IntentDirectory::new(fingerprint(&[1; 32]));
//! directory.declare_intent("admin", "Administrative operations", true).unwrap();
//!
//! let sender = fingerprint(&[2; 32]);
//! let requested = vec![IntentName::new("admin").unwrap()];
//! assert!(!directory.authorize(&sender, &requested).unwrap().allowed);
//!
//! let recipient = X25519StaticSecret::from_bytes([7; 32]);
//! let sealed = SealedEnvelope::seal(b"hello", &recipient.public_key()).unwrap();
//! assert_eq!(sealed.open(&recipient).unwrap(), b"hello");
//! ```

pub mod crypto;
pub mod directory;
pub mod error;
pub mod grant;
pub mod intent;
pub mod registry;
pub mod seal;

pub use crypto::{EncryptionKey, EncryptionNonce, EphemeralKeyPair, SharedKey};
pub use directory::{authorize, Authorization, IntentDirectory};
pub use error::{PermsError, Result};
pub use grant::PermissionGrant;
pub use intent::{Intent, IntentCatalog, IntentSpec, DEFAULT_INTENT_DESCRIPTION};
pub use registry::IntentRegistry;
pub use seal::{decrypt, encrypt, SealedEnvelope};
