//! The Agent: unified API for an intentmail identity.
//!
//! An agent owns its key material and intent registry, persists both through
//! a [`Store`], and talks to other agents through a [`Relay`].

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use intentmail_core::{
    parse_and_verify, read_claimed_sender, Content, EnvelopeBuilder, Fingerprint, IntentName,
    KeyMaterial, MessageEnvelope, MessageId, PublicIdentity, SenderInfo, ValidationError,
};
use intentmail_perms::{Authorization, Intent, IntentDirectory, IntentRegistry, SealedEnvelope};
use intentmail_store::{Store, StoreExt};

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::relay::{DeliveryReceipt, Relay, RelayError};

/// Result of [`Agent::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The relay accepted the sealed envelope.
    Delivered {
        message_id: MessageId,
        receipt: DeliveryReceipt,
    },

    /// The recipient does not accept these intents from us. Nothing was sent.
    Denied(Authorization),
}

impl SendOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SendOutcome::Delivered { .. })
    }

    /// Guidance for the user when the send was denied.
    pub fn bounce_message(&self, recipient: &str) -> Option<String> {
        match self {
            SendOutcome::Delivered { .. } => None,
            SendOutcome::Denied(auth) => auth.bounce_message(recipient),
        }
    }
}

/// One envelope taken from the inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboxItem {
    /// Decrypted, signature verified, sender matched, intents allowed.
    Verified(MessageEnvelope),

    /// Dropped. The content is never exposed.
    Rejected {
        reason: String,
        /// Corrupted, forged, or not for us, rather than a local fault.
        crypto_failure: bool,
    },
}

impl InboxItem {
    pub fn verified(&self) -> Option<&MessageEnvelope> {
        match self {
            InboxItem::Verified(envelope) => Some(envelope),
            InboxItem::Rejected { .. } => None,
        }
    }
}

/// An intentmail identity bound to a store and a relay.
pub struct Agent<S: Store, R: Relay> {
    keys: KeyMaterial,
    config: AgentConfig,
    store: Arc<S>,
    relay: Arc<R>,
    registry: IntentRegistry,

    /// Serializes directory changes so persisted and published copies land
    /// in the order they were made.
    publish: Mutex<()>,
}

impl<S: Store, R: Relay> Agent<S, R> {
    /// Bring up an agent.
    ///
    /// Loads key material and the intent directory for `config.agent_id`,
    /// generating keys and a default directory on first use. Persists the
    /// config and publishes the identity and directory to the relay.
    pub async fn init(store: Arc<S>, relay: Arc<R>, config: AgentConfig) -> Result<Self> {
        config.validate()?;
        let id = config.agent_id.clone();

        let keys = match store.load_key_material(&id).await? {
            Some(stored) => {
                let keys = KeyMaterial::from_stored(&stored)?;
                debug!(agent = %id, fingerprint = %keys.fingerprint(), "loaded key material");
                keys
            }
            None => {
                let keys = KeyMaterial::generate()?;
                store.save_key_material(&id, &keys.to_stored()).await?;
                info!(agent = %id, fingerprint = %keys.fingerprint(), "generated key material");
                keys
            }
        };

        let directory = store
            .load_or_default_directory(&id, &keys.fingerprint())
            .await?;
        if directory.owner() != &keys.fingerprint() {
            return Err(AgentError::InvalidInput(format!(
                "stored intent directory of {id} belongs to {}",
                directory.owner()
            )));
        }
        store.save_intent_directory(&id, &directory).await?;

        let config_json = serde_json::to_value(&config)
            .map_err(|e| AgentError::InvalidInput(format!("config: {e}")))?;
        store.save_config(&id, &config_json).await?;

        let agent = Self {
            registry: IntentRegistry::from_directory(directory.clone()),
            keys,
            config,
            store,
            relay,
            publish: Mutex::new(()),
        };

        agent.relay.publish_identity(&agent.public_identity()).await?;
        agent.relay.publish_directory(&id, &directory).await?;
        info!(agent = %id, "agent ready");

        Ok(agent)
    }

    /// Reopen an agent using the config saved in the store, or the default
    /// config for `agent_id` if none was saved.
    pub async fn open(store: Arc<S>, relay: Arc<R>, agent_id: &str) -> Result<Self> {
        let config = match store.load_config(agent_id).await? {
            Some(json) => serde_json::from_value(json)
                .map_err(|e| AgentError::InvalidInput(format!("stored config: {e}")))?,
            None => AgentConfig::new(agent_id),
        };
        if config.agent_id != agent_id {
            return Err(AgentError::InvalidInput(format!(
                "stored config under {agent_id} names {}",
                config.agent_id
            )));
        }
        Self::init(store, relay, config).await
    }

    pub fn agent_id(&self) -> &str {
        &self.config.agent_id
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.keys.fingerprint()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// The identity card published to the relay.
    pub fn public_identity(&self) -> PublicIdentity {
        self.keys
            .public_identity(self.config.agent_id.clone(), self.config.display_name.clone())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn relay(&self) -> &R {
        &self.relay
    }

    fn sender_info(&self) -> SenderInfo {
        SenderInfo {
            agent_id: self.config.agent_id.clone(),
            fingerprint: self.fingerprint(),
            display_name: self.config.display_name.clone(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Intent Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Declared intents, ordered by name.
    pub fn intents(&self) -> Vec<Intent> {
        self.registry.intents()
    }

    /// A consistent copy of the intent directory, grants included.
    pub fn directory(&self) -> IntentDirectory {
        self.registry.snapshot()
    }

    /// Declare or update an intent, then persist and publish.
    pub async fn declare_intent(
        &self,
        name: &str,
        description: &str,
        privileged: bool,
    ) -> Result<Intent> {
        let intent = self
            .change_directory(|dir| dir.declare_intent(name, description, privileged))
            .await?;
        info!(agent = %self.agent_id(), intent = %intent.name, privileged, "declared intent");
        Ok(intent)
    }

    /// Remove an intent. `chat` cannot be removed.
    pub async fn remove_intent(&self, name: &str) -> Result<Intent> {
        let intent = self.change_directory(|dir| dir.remove_intent(name)).await?;
        info!(agent = %self.agent_id(), intent = %intent.name, "removed intent");
        Ok(intent)
    }

    /// Allow the agent behind `handle` to use `intent`. Returns whether a new
    /// grant was recorded.
    pub async fn grant(&self, handle: &str, intent: &str) -> Result<bool> {
        let grantee = self.resolve_contact(handle).await?;
        let changed = self
            .change_directory(|dir| dir.grant(&grantee.fingerprint, intent))
            .await?;
        if changed {
            info!(agent = %self.agent_id(), grantee = %handle, intent, "granted intent");
        }
        Ok(changed)
    }

    /// Withdraw a grant. Returns whether one existed.
    pub async fn revoke(&self, handle: &str, intent: &str) -> Result<bool> {
        let grantee = self.resolve_contact(handle).await?;
        let changed = self
            .change_directory(|dir| dir.revoke(&grantee.fingerprint, intent))
            .await?;
        if changed {
            info!(agent = %self.agent_id(), grantee = %handle, intent, "revoked intent");
        }
        Ok(changed)
    }

    /// Apply `f` to a draft of the directory, save and publish the draft, and
    /// only then make it the live directory.
    ///
    /// If saving or publishing fails the live directory is unchanged and a
    /// retry repeats the whole change.
    async fn change_directory<T>(
        &self,
        f: impl FnOnce(&mut IntentDirectory) -> intentmail_perms::Result<T>,
    ) -> Result<T> {
        let _guard = self.publish.lock().await;
        let current = self.registry.snapshot();
        let mut draft = current.clone();
        let out = f(&mut draft)?;
        if draft == current {
            return Ok(out);
        }

        let id = self.agent_id();
        self.store.save_intent_directory(id, &draft).await?;
        if let Err(e) = self.relay.publish_directory(id, &draft).await {
            if let Err(restore) = self.store.save_intent_directory(id, &current).await {
                warn!(agent = %id, error = %restore, "could not restore saved intent directory");
            }
            return Err(e.into());
        }

        self.registry.replace(draft)?;
        Ok(out)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Contacts
    // ─────────────────────────────────────────────────────────────────────────

    /// Remember a peer identity obtained out of band.
    pub async fn add_contact(&self, contact: &PublicIdentity) -> Result<()> {
        contact.validate()?;
        self.store.save_contact(self.agent_id(), contact).await?;
        Ok(())
    }

    pub async fn contacts(&self) -> Result<Vec<PublicIdentity>> {
        Ok(self.store.load_contacts(self.agent_id()).await?)
    }

    /// Resolve a handle to a public identity: contacts first, then the
    /// relay. Relay results are cached as contacts.
    pub async fn resolve_contact(&self, handle: &str) -> Result<PublicIdentity> {
        if let Some(contact) = self.store.get_contact(self.agent_id(), handle).await? {
            return Ok(contact);
        }

        let identity = self
            .relay
            .lookup_identity(handle)
            .await?
            .ok_or_else(|| AgentError::UnknownRecipient(handle.to_string()))?;
        if identity.agent_id != handle {
            return Err(AgentError::IdentityMismatch {
                agent_id: handle.to_string(),
                reason: format!("relay returned identity for {}", identity.agent_id),
            });
        }
        identity.validate()?;

        self.store.save_contact(self.agent_id(), &identity).await?;
        debug!(agent = %self.agent_id(), contact = %handle, "cached contact from relay");
        Ok(identity)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Messaging
    // ─────────────────────────────────────────────────────────────────────────

    /// Ask the relay whether it would deliver `intents` to `recipient`.
    pub async fn check_permission(
        &self,
        recipient: &str,
        intents: &[&str],
    ) -> Result<Authorization> {
        let requested = parse_intents(intents)?;
        Ok(self
            .relay
            .check_permission(&self.fingerprint(), recipient, &requested)
            .await?)
    }

    /// Sign, seal, and deliver a message.
    ///
    /// An empty `intents` list means `chat`. With
    /// [`AgentConfig::precheck_intents`] set, the recipient's directory view
    /// is checked first and a denial returns before anything is encrypted.
    /// The relay checks again on delivery and its denial is reported the
    /// same way.
    pub async fn send(
        &self,
        recipient: &str,
        intents: &[&str],
        content: Content,
    ) -> Result<SendOutcome> {
        let requested = parse_intents(intents)?;
        let contact = self.resolve_contact(recipient).await?;
        let me = self.fingerprint();

        let view = self.relay.fetch_directory_view(recipient, &me).await?;
        if view.owner() != &contact.fingerprint {
            return Err(AgentError::IdentityMismatch {
                agent_id: recipient.to_string(),
                reason: "relay directory belongs to a different key".into(),
            });
        }

        if self.config.precheck_intents {
            let auth = view.authorize(&me, &requested)?;
            if !auth.allowed {
                warn!(
                    agent = %self.agent_id(),
                    recipient,
                    blocked = ?auth.blocked,
                    "send denied by local intent check"
                );
                return Ok(SendOutcome::Denied(auth));
            }
        }

        let envelope = EnvelopeBuilder::new(self.sender_info())
            .intents(view.snapshots(&requested))
            .content(content)
            .sign(&self.keys)?;
        let sealed = SealedEnvelope::seal(&envelope.to_bytes()?, &contact.agreement_public_key)?;

        match self.relay.deliver(&me, recipient, &requested, sealed).await {
            Ok(receipt) => {
                info!(
                    agent = %self.agent_id(),
                    recipient,
                    message_id = %envelope.message_id,
                    "message delivered"
                );
                Ok(SendOutcome::Delivered {
                    message_id: envelope.message_id,
                    receipt,
                })
            }
            Err(RelayError::Denied(auth)) => {
                warn!(
                    agent = %self.agent_id(),
                    recipient,
                    blocked = ?auth.blocked,
                    "send denied by relay"
                );
                Ok(SendOutcome::Denied(auth))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Send `text` in the configured default format.
    pub async fn send_text(
        &self,
        recipient: &str,
        intents: &[&str],
        text: &str,
    ) -> Result<SendOutcome> {
        let content = Content {
            format: self.config.default_format,
            data: text.to_string(),
            human_message: None,
        };
        self.send(recipient, intents, content).await
    }

    /// Drain the inbox, verifying each envelope.
    ///
    /// Every envelope taken from the relay yields one item; failures are
    /// reported as [`InboxItem::Rejected`] rather than aborting the batch.
    pub async fn receive(&self) -> Result<Vec<InboxItem>> {
        let inbox = self.relay.fetch_inbox(self.agent_id()).await?;
        let mut items = Vec::with_capacity(inbox.len());

        for sealed in &inbox {
            match self.open_envelope(sealed).await {
                Ok(envelope) => {
                    debug!(
                        agent = %self.agent_id(),
                        from = %envelope.sender.agent_id,
                        message_id = %envelope.message_id,
                        "verified message"
                    );
                    items.push(InboxItem::Verified(envelope));
                }
                Err(e) => {
                    warn!(agent = %self.agent_id(), error = %e, "rejected inbox item");
                    items.push(InboxItem::Rejected {
                        reason: e.to_string(),
                        crypto_failure: e.is_crypto_failure(),
                    });
                }
            }
        }

        Ok(items)
    }

    /// Open one sealed envelope addressed to this agent.
    ///
    /// Decrypts, resolves the claimed sender, checks the claimed fingerprint
    /// against the resolved identity, verifies the signature, and re-checks
    /// the intents against this agent's own directory.
    pub async fn open_envelope(&self, sealed: &SealedEnvelope) -> Result<MessageEnvelope> {
        let bytes = sealed.open(self.keys.agreement())?;

        let claimed = read_claimed_sender(&bytes)?;
        let contact = match self.resolve_contact(&claimed.agent_id).await {
            Err(AgentError::UnknownRecipient(handle)) => {
                return Err(AgentError::UnknownSender(handle))
            }
            other => other?,
        };
        if contact.fingerprint != claimed.fingerprint {
            return Err(ValidationError::FingerprintMismatch {
                expected: contact.fingerprint.to_string(),
                actual: claimed.fingerprint.to_string(),
            }
            .into());
        }

        let envelope = parse_and_verify(&bytes, &contact.signing_public_key)?;

        let auth = self
            .registry
            .authorize(&contact.fingerprint, &envelope.intent_names())?;
        if !auth.allowed {
            return Err(AgentError::IntentsNotAllowed {
                sender: contact.agent_id,
                blocked: auth.blocked.iter().map(|n| n.to_string()).collect(),
            });
        }

        Ok(envelope)
    }
}

/// Parse requested intent names, keeping first occurrences in order.
fn parse_intents(intents: &[&str]) -> Result<Vec<IntentName>> {
    if intents.is_empty() {
        return Ok(vec![IntentName::chat()]);
    }

    let mut parsed: Vec<IntentName> = Vec::with_capacity(intents.len());
    for raw in intents {
        let name = IntentName::new(*raw)
            .map_err(|_| AgentError::InvalidInput(format!("invalid intent name: {raw:?}")))?;
        if !parsed.contains(&name) {
            parsed.push(name);
        }
    }
    Ok(parsed)
}
