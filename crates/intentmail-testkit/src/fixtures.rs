//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use intentmail::{Agent, AgentConfig};
use intentmail_core::{
    Content, EnvelopeBuilder, IntentName, IntentSnapshot, KeyMaterial, MessageEnvelope,
    PublicIdentity, SenderInfo,
};
use intentmail_store::MemoryStore;

use crate::relay::MemoryRelay;

/// An agent wired to a memory store and a memory relay.
pub type TestAgent = Agent<MemoryStore, MemoryRelay>;

/// A shared relay plus helpers to bring agents up on it.
#[derive(Clone, Default)]
pub struct TestNetwork {
    pub relay: Arc<MemoryRelay>,
}

impl TestNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an agent with default settings and a fresh store.
    pub async fn agent(&self, agent_id: &str) -> TestAgent {
        self.agent_with(AgentConfig::new(agent_id)).await
    }

    /// Start an agent with a custom config and a fresh store.
    pub async fn agent_with(&self, config: AgentConfig) -> TestAgent {
        Agent::init(Arc::new(MemoryStore::new()), Arc::clone(&self.relay), config)
            .await
            .expect("agent init")
    }

    /// Start an agent on an existing store.
    pub async fn agent_on(&self, store: Arc<MemoryStore>, agent_id: &str) -> TestAgent {
        Agent::open(store, Arc::clone(&self.relay), agent_id)
            .await
            .expect("agent open")
    }
}

/// A deterministic identity that signs envelopes directly, without an agent.
pub struct TestIdentity {
    pub agent_id: String,
    pub keys: KeyMaterial,
}

impl TestIdentity {
    /// Create with fresh random keys.
    pub fn new(agent_id: &str) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            keys: KeyMaterial::generate().expect("key generation"),
        }
    }

    /// Create with deterministic keys derived from `seed`.
    pub fn with_seed(agent_id: &str, seed: u8) -> Self {
        let mut agreement = [seed; 32];
        agreement[31] ^= 0xff;
        Self {
            agent_id: agent_id.to_string(),
            keys: KeyMaterial::from_secrets(&[seed; 32], agreement),
        }
    }

    pub fn public_identity(&self) -> PublicIdentity {
        self.keys.public_identity(self.agent_id.clone(), None)
    }

    pub fn sender_info(&self) -> SenderInfo {
        SenderInfo {
            agent_id: self.agent_id.clone(),
            fingerprint: self.keys.fingerprint(),
            display_name: None,
        }
    }

    /// Sign a text envelope addressing `intents`.
    pub fn text_envelope(&self, intents: &[&str], text: &str) -> MessageEnvelope {
        let snapshots = intents.iter().map(|name| {
            IntentSnapshot::new(IntentName::new(*name).expect("intent name"), "")
        });
        EnvelopeBuilder::new(self.sender_info())
            .intents(snapshots)
            .content(Content::text(text))
            .sign(&self.keys)
            .expect("sign envelope")
    }
}

/// Create multiple deterministic identities for multi-party tests.
pub fn multi_party_identities(count: usize) -> Vec<TestIdentity> {
    (0..count)
        .map(|i| TestIdentity::with_seed(&format!("agent-{i}"), i as u8 + 1))
        .collect()
}

/// Install a test-writer tracing subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
