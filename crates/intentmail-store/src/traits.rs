//! Store trait: the abstract interface for local identity persistence.
//!
//! Everything is keyed by `identity_id`, the local name of an identity, so
//! one store can hold several identities side by side. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use serde_json::Value;

use intentmail_core::{Fingerprint, PublicIdentity, StoredKeyMaterial};
use intentmail_perms::IntentDirectory;

use crate::error::Result;

/// Async interface for local persistence.
///
/// Missing records load as `None`. Saves replace any previous record.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Key Material
    // ─────────────────────────────────────────────────────────────────────────

    async fn load_key_material(&self, identity_id: &str) -> Result<Option<StoredKeyMaterial>>;

    async fn save_key_material(&self, identity_id: &str, keys: &StoredKeyMaterial) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Intent Directory
    // ─────────────────────────────────────────────────────────────────────────

    async fn load_intent_directory(&self, identity_id: &str) -> Result<Option<IntentDirectory>>;

    async fn save_intent_directory(
        &self,
        identity_id: &str,
        directory: &IntentDirectory,
    ) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Contacts
    // ─────────────────────────────────────────────────────────────────────────

    /// All contacts, ordered by agent id.
    async fn load_contacts(&self, identity_id: &str) -> Result<Vec<PublicIdentity>>;

    /// Insert or replace a contact, keyed by its agent id.
    async fn save_contact(&self, identity_id: &str, contact: &PublicIdentity) -> Result<()>;

    async fn get_contact(&self, identity_id: &str, agent_id: &str)
        -> Result<Option<PublicIdentity>>;

    /// Remove a contact. Returns whether it existed.
    async fn remove_contact(&self, identity_id: &str, agent_id: &str) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Config
    // ─────────────────────────────────────────────────────────────────────────

    /// Configuration is stored as opaque JSON owned by the caller.
    async fn load_config(&self, identity_id: &str) -> Result<Option<Value>>;

    async fn save_config(&self, identity_id: &str, config: &Value) -> Result<()>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Load the intent directory, or a fresh one holding only `chat`.
    fn load_or_default_directory(
        &self,
        identity_id: &str,
        owner: &Fingerprint,
    ) -> impl std::future::Future<Output = Result<IntentDirectory>> + Send;

    /// Find a contact by fingerprint.
    fn find_contact_by_fingerprint(
        &self,
        identity_id: &str,
        fingerprint: &Fingerprint,
    ) -> impl std::future::Future<Output = Result<Option<PublicIdentity>>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn load_or_default_directory(
        &self,
        identity_id: &str,
        owner: &Fingerprint,
    ) -> Result<IntentDirectory> {
        Ok(self
            .load_intent_directory(identity_id)
            .await?
            .unwrap_or_else(|| IntentDirectory::new(owner.clone())))
    }

    async fn find_contact_by_fingerprint(
        &self,
        identity_id: &str,
        fingerprint: &Fingerprint,
    ) -> Result<Option<PublicIdentity>> {
        Ok(self
            .load_contacts(identity_id)
            .await?
            .into_iter()
            .find(|contact| &contact.fingerprint == fingerprint))
    }
}
