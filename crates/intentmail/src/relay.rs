//! Relay contract: the service that routes sealed envelopes between agents.
//!
//! The relay knows public identities and intent directories and holds
//! inboxes of sealed envelopes. It runs the authoritative authorization
//! check on delivery. It never sees plaintext.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use intentmail_core::{Fingerprint, IntentName, PublicIdentity};
use intentmail_perms::{Authorization, IntentCatalog, IntentDirectory, PermsError, SealedEnvelope};

/// Errors returned by a relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No identity is registered under the handle.
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    /// The recipient's intents do not admit this message.
    #[error("delivery denied, blocked intents: {}", blocked_list(.0))]
    Denied(Authorization),

    /// The relay refused a malformed request.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The relay could not be reached or failed internally.
    #[error("relay unavailable: {0}")]
    Unavailable(String),
}

fn blocked_list(auth: &Authorization) -> String {
    auth.blocked
        .iter()
        .map(IntentName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<PermsError> for RelayError {
    fn from(e: PermsError) -> Self {
        RelayError::Rejected(e.to_string())
    }
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Acknowledgement of an accepted delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub recipient: String,

    /// Relay clock at acceptance (Unix milliseconds).
    pub accepted_at: i64,
}

/// The relay as seen by an agent.
///
/// Handles are agent ids. Transport, authentication of the caller, retries,
/// and timeouts belong to the implementation.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Register or refresh this agent's public identity.
    async fn publish_identity(&self, identity: &PublicIdentity) -> Result<()>;

    /// Look up a public identity by handle.
    async fn lookup_identity(&self, handle: &str) -> Result<Option<PublicIdentity>>;

    /// Replace the stored directory (intents and grants) of `handle`.
    async fn publish_directory(&self, handle: &str, directory: &IntentDirectory) -> Result<()>;

    /// The public intent catalog of `handle`.
    async fn fetch_intents(&self, handle: &str) -> Result<IntentCatalog>;

    /// The directory of `recipient` as `sender` may see it: the full catalog
    /// and only the grants held by `sender`.
    async fn fetch_directory_view(
        &self,
        recipient: &str,
        sender: &Fingerprint,
    ) -> Result<IntentDirectory>;

    /// Run the authorization check without delivering anything.
    async fn check_permission(
        &self,
        sender: &Fingerprint,
        recipient: &str,
        intents: &[IntentName],
    ) -> Result<Authorization>;

    /// Queue a sealed envelope for `recipient` if `intents` are authorized.
    ///
    /// A denial is [`RelayError::Denied`] and nothing is queued.
    async fn deliver(
        &self,
        sender: &Fingerprint,
        recipient: &str,
        intents: &[IntentName],
        sealed: SealedEnvelope,
    ) -> Result<DeliveryReceipt>;

    /// Take every envelope waiting for `handle`.
    async fn fetch_inbox(&self, handle: &str) -> Result<Vec<SealedEnvelope>>;
}
