//! # intentmail Testkit
//!
//! Testing utilities for intentmail.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Fixed secrets and messages with the canonical bytes,
//!   fingerprints, and signatures every implementation must reproduce
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Deterministic identities and a [`TestNetwork`] of agents
//! - **Relay**: [`MemoryRelay`], an in-process relay that enforces intents
//!
//! ## Golden Vectors
//!
//! ```rust
//! use intentmail_testkit::vectors::verify_all_vectors;
//!
//! for report in verify_all_vectors() {
//!     assert!(report.matches, "{}", report.name);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use intentmail_testkit::generators::{envelope_from_params, EnvelopeParams};
//!
//! proptest! {
//!     #[test]
//!     fn envelopes_verify(params: EnvelopeParams) {
//!         let envelope = envelope_from_params(&params);
//!         prop_assert!(envelope.verify(&params.keys.signing_public()));
//!     }
//! }
//! ```
//!
//! ## Test Network
//!
//! ```rust,no_run
//! use intentmail_testkit::TestNetwork;
//!
//! # async fn demo() {
//! let net = TestNetwork::new();
//! let alice = net.agent("alice").await;
//! let bob = net.agent("bob").await;
//!
//! alice.send_text("bob", &["chat"], "hi").await.unwrap();
//! let inbox = bob.receive().await.unwrap();
//! assert_eq!(inbox.len(), 1);
//! # }
//! ```

pub mod fixtures;
pub mod generators;
pub mod relay;
pub mod vectors;

pub use fixtures::{init_tracing, multi_party_identities, TestAgent, TestIdentity, TestNetwork};
pub use relay::MemoryRelay;
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
