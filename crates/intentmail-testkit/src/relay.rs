//! In-memory relay for tests.
//!
//! Holds identities, directories, and inboxes in process and runs the same
//! authorization check a production relay runs before queueing a message.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use intentmail::relay::Result;
use intentmail::{DeliveryReceipt, Relay, RelayError};
use intentmail_core::{now_millis, Fingerprint, IntentName, PublicIdentity};
use intentmail_perms::{Authorization, IntentCatalog, IntentDirectory, SealedEnvelope};

/// A relay that keeps everything in memory.
#[derive(Default)]
pub struct MemoryRelay {
    inner: RwLock<RelayState>,
}

#[derive(Default)]
struct RelayState {
    identities: HashMap<String, PublicIdentity>,
    directories: HashMap<String, IntentDirectory>,
    inboxes: HashMap<String, Vec<SealedEnvelope>>,
}

impl RelayState {
    fn directory(&self, handle: &str) -> Result<&IntentDirectory> {
        self.directories
            .get(handle)
            .ok_or_else(|| RelayError::UnknownAgent(handle.to_string()))
    }
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an arbitrary sealed envelope, bypassing authorization.
    ///
    /// Lets tests play a relay that misbehaves or an attacker with write
    /// access to an inbox.
    pub async fn inject(&self, recipient: &str, sealed: SealedEnvelope) {
        self.inner
            .write()
            .await
            .inboxes
            .entry(recipient.to_string())
            .or_default()
            .push(sealed);
    }

    /// Number of envelopes waiting for `handle`.
    pub async fn pending(&self, handle: &str) -> usize {
        self.inner
            .read()
            .await
            .inboxes
            .get(handle)
            .map_or(0, Vec::len)
    }

    /// The full stored directory of `handle`, grants included.
    pub async fn directory(&self, handle: &str) -> Option<IntentDirectory> {
        self.inner.read().await.directories.get(handle).cloned()
    }
}

#[async_trait]
impl Relay for MemoryRelay {
    async fn publish_identity(&self, identity: &PublicIdentity) -> Result<()> {
        identity
            .validate()
            .map_err(|e| RelayError::Rejected(e.to_string()))?;

        let mut state = self.inner.write().await;
        if let Some(existing) = state.identities.get(&identity.agent_id) {
            if existing.fingerprint != identity.fingerprint {
                return Err(RelayError::Rejected(format!(
                    "handle {} is registered to another key",
                    identity.agent_id
                )));
            }
        }
        state
            .identities
            .insert(identity.agent_id.clone(), identity.clone());
        tracing::debug!(
            agent = %identity.agent_id,
            fingerprint = %identity.fingerprint,
            "identity published"
        );
        Ok(())
    }

    async fn lookup_identity(&self, handle: &str) -> Result<Option<PublicIdentity>> {
        Ok(self.inner.read().await.identities.get(handle).cloned())
    }

    async fn publish_directory(&self, handle: &str, directory: &IntentDirectory) -> Result<()> {
        let mut state = self.inner.write().await;
        let identity = state
            .identities
            .get(handle)
            .ok_or_else(|| RelayError::UnknownAgent(handle.to_string()))?;
        if directory.owner() != &identity.fingerprint {
            return Err(RelayError::Rejected(format!(
                "directory owner {} is not {handle}",
                directory.owner()
            )));
        }
        state
            .directories
            .insert(handle.to_string(), directory.clone());
        Ok(())
    }

    async fn fetch_intents(&self, handle: &str) -> Result<IntentCatalog> {
        let state = self.inner.read().await;
        Ok(state.directory(handle)?.catalog().clone())
    }

    async fn fetch_directory_view(
        &self,
        recipient: &str,
        sender: &Fingerprint,
    ) -> Result<IntentDirectory> {
        let state = self.inner.read().await;
        Ok(state.directory(recipient)?.view_for(sender))
    }

    async fn check_permission(
        &self,
        sender: &Fingerprint,
        recipient: &str,
        intents: &[IntentName],
    ) -> Result<Authorization> {
        let state = self.inner.read().await;
        Ok(state.directory(recipient)?.authorize(sender, intents)?)
    }

    async fn deliver(
        &self,
        sender: &Fingerprint,
        recipient: &str,
        intents: &[IntentName],
        sealed: SealedEnvelope,
    ) -> Result<DeliveryReceipt> {
        let mut state = self.inner.write().await;
        let auth = state.directory(recipient)?.authorize(sender, intents)?;
        if !auth.allowed {
            tracing::debug!(%sender, recipient, blocked = ?auth.blocked, "delivery denied");
            return Err(RelayError::Denied(auth));
        }

        state
            .inboxes
            .entry(recipient.to_string())
            .or_default()
            .push(sealed);
        tracing::debug!(%sender, recipient, "delivery accepted");

        Ok(DeliveryReceipt {
            recipient: recipient.to_string(),
            accepted_at: now_millis(),
        })
    }

    async fn fetch_inbox(&self, handle: &str) -> Result<Vec<SealedEnvelope>> {
        Ok(self
            .inner
            .write()
            .await
            .inboxes
            .remove(handle)
            .unwrap_or_default())
    }
}
