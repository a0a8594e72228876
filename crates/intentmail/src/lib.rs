//! # intentmail
//!
//! The unified API for intentmail - portable agent identities that exchange
//! signed, encrypted messages through an untrusted relay, gated by intents.
//!
//! ## Overview
//!
//! - **Identity**: an Ed25519 signing key and an X25519 agreement key,
//!   labelled by a fingerprint of the agreement key
//! - **Intents**: the message purposes an identity accepts; privileged
//!   intents need an explicit grant
//! - **Envelopes**: canonical-JSON messages signed by the sender and sealed
//!   to the recipient
//! - **Relay**: routes sealed envelopes and enforces intent authorization
//!
//! ## Enforcement
//!
//! Authorization runs twice on the way out: the sender checks the
//! recipient's directory view before encrypting, and the relay checks again
//! before queueing. The recipient checks once more on receipt.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use intentmail::{Agent, AgentConfig, Relay, SendOutcome};
//! use intentmail::core::Content;
//! use intentmail::store::SqliteStore;
//!
//! async fn example<R: Relay>(relay: Arc<R>) {
//!     let store = Arc::new(SqliteStore::open("alice.db").unwrap());
//!     let config = AgentConfig::new("alice").with_display_name("Alice");
//!     let alice = Agent::init(store, relay, config).await.unwrap();
//!
//!     alice.declare_intent("admin", "Administrative operations", true).await.unwrap();
//!
//!     match alice.send("bob", &["task"], Content::text("ship it")).await.unwrap() {
//!         SendOutcome::Delivered { message_id, .. } => println!("sent {message_id}"),
//!         SendOutcome::Denied(auth) => println!("{:?}", auth.bounce_message("bob")),
//!     }
//!
//!     for item in alice.receive().await.unwrap() {
//!         if let Some(envelope) = item.verified() {
//!             println!("{}: {}", envelope.sender.agent_id, envelope.content.data);
//!         }
//!     }
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `intentmail::core` - Keys, fingerprints, canonical JSON, envelopes
//! - `intentmail::perms` - Intents, grants, authorization, sealing
//! - `intentmail::store` - Local persistence

pub mod agent;
pub mod config;
pub mod error;
pub mod relay;

// Re-export component crates
pub use intentmail_core as core;
pub use intentmail_perms as perms;
pub use intentmail_store as store;

pub use agent::{Agent, InboxItem, SendOutcome};
pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use relay::{DeliveryReceipt, Relay, RelayError};

// Re-export commonly used types
pub use intentmail_core::{
    Content, ContentFormat, Fingerprint, IntentName, KeyMaterial, MessageEnvelope, MessageId,
    PublicIdentity,
};
pub use intentmail_perms::{Authorization, Intent, IntentCatalog, IntentDirectory, SealedEnvelope};
