//! In-memory implementation of the Store trait.
//!
//! Primarily for testing. Same semantics as SQLite, no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use intentmail_core::{PublicIdentity, StoredKeyMaterial};
use intentmail_perms::IntentDirectory;

use crate::error::Result;
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    keys: HashMap<String, StoredKeyMaterial>,
    directories: HashMap<String, IntentDirectory>,

    /// identity_id -> agent_id -> contact.
    contacts: HashMap<String, BTreeMap<String, PublicIdentity>>,

    configs: HashMap<String, Value>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryStoreInner) -> T) -> T {
        f(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<T>(&self, f: impl FnOnce(&mut MemoryStoreInner) -> T) -> T {
        f(&mut self.inner.write().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_key_material(&self, identity_id: &str) -> Result<Option<StoredKeyMaterial>> {
        Ok(self.read(|inner| inner.keys.get(identity_id).cloned()))
    }

    async fn save_key_material(&self, identity_id: &str, keys: &StoredKeyMaterial) -> Result<()> {
        self.write(|inner| inner.keys.insert(identity_id.to_string(), keys.clone()));
        Ok(())
    }

    async fn load_intent_directory(&self, identity_id: &str) -> Result<Option<IntentDirectory>> {
        Ok(self.read(|inner| inner.directories.get(identity_id).cloned()))
    }

    async fn save_intent_directory(
        &self,
        identity_id: &str,
        directory: &IntentDirectory,
    ) -> Result<()> {
        self.write(|inner| {
            inner
                .directories
                .insert(identity_id.to_string(), directory.clone())
        });
        Ok(())
    }

    async fn load_contacts(&self, identity_id: &str) -> Result<Vec<PublicIdentity>> {
        Ok(self.read(|inner| {
            inner
                .contacts
                .get(identity_id)
                .map(|book| book.values().cloned().collect())
                .unwrap_or_default()
        }))
    }

    async fn save_contact(&self, identity_id: &str, contact: &PublicIdentity) -> Result<()> {
        contact.validate()?;
        self.write(|inner| {
            inner
                .contacts
                .entry(identity_id.to_string())
                .or_default()
                .insert(contact.agent_id.clone(), contact.clone())
        });
        Ok(())
    }

    async fn get_contact(
        &self,
        identity_id: &str,
        agent_id: &str,
    ) -> Result<Option<PublicIdentity>> {
        Ok(self.read(|inner| {
            inner
                .contacts
                .get(identity_id)
                .and_then(|book| book.get(agent_id).cloned())
        }))
    }

    async fn remove_contact(&self, identity_id: &str, agent_id: &str) -> Result<bool> {
        Ok(self.write(|inner| {
            inner
                .contacts
                .get_mut(identity_id)
                .is_some_and(|book| book.remove(agent_id).is_some())
        }))
    }

    async fn load_config(&self, identity_id: &str) -> Result<Option<Value>> {
        Ok(self.read(|inner| inner.configs.get(identity_id).cloned()))
    }

    async fn save_config(&self, identity_id: &str, config: &Value) -> Result<()> {
        self.write(|inner| inner.configs.insert(identity_id.to_string(), config.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StoreExt;
    use intentmail_core::KeyMaterial;

    #[tokio::test]
    async fn test_missing_records_load_as_none() {
        let store = MemoryStore::new();
        assert!(store.load_key_material("alice").await.unwrap().is_none());
        assert!(store.load_intent_directory("alice").await.unwrap().is_none());
        assert!(store.load_contacts("alice").await.unwrap().is_empty());
        assert!(store.load_config("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_key_material_roundtrip() {
        let store = MemoryStore::new();
        let keys = KeyMaterial::generate().unwrap();
        store.save_key_material("alice", &keys.to_stored()).await.unwrap();

        let stored = store.load_key_material("alice").await.unwrap().unwrap();
        let restored = KeyMaterial::from_stored(&stored).unwrap();
        assert_eq!(restored.fingerprint(), keys.fingerprint());
    }

    #[tokio::test]
    async fn test_directory_default_and_roundtrip() {
        let store = MemoryStore::new();
        let keys = KeyMaterial::generate().unwrap();

        let mut directory = store
            .load_or_default_directory("alice", &keys.fingerprint())
            .await
            .unwrap();
        assert_eq!(directory.intents().len(), 1);

        directory.declare_intent("admin", "Admin", true).unwrap();
        store.save_intent_directory("alice", &directory).await.unwrap();
        let loaded = store.load_intent_directory("alice").await.unwrap().unwrap();
        assert_eq!(loaded, directory);
    }

    #[tokio::test]
    async fn test_contacts_are_per_identity() {
        let store = MemoryStore::new();
        let bob = KeyMaterial::generate().unwrap().public_identity("bob", None);

        store.save_contact("alice", &bob).await.unwrap();
        assert_eq!(store.get_contact("alice", "bob").await.unwrap(), Some(bob.clone()));
        assert!(store.get_contact("carol", "bob").await.unwrap().is_none());

        let found = store
            .find_contact_by_fingerprint("alice", &bob.fingerprint)
            .await
            .unwrap();
        assert_eq!(found, Some(bob));

        assert!(store.remove_contact("alice", "bob").await.unwrap());
        assert!(!store.remove_contact("alice", "bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_inconsistent_contact_rejected() {
        let store = MemoryStore::new();
        let mut bob = KeyMaterial::generate().unwrap().public_identity("bob", None);
        bob.fingerprint = KeyMaterial::generate().unwrap().fingerprint();

        assert!(store.save_contact("alice", &bob).await.is_err());
    }
}
