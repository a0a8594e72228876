//! Shared, owned intent registry for one identity.
//!
//! Wraps an [`IntentDirectory`] in an `RwLock`. Every mutation runs on a
//! private copy under the write lock and is committed only if it succeeds,
//! so readers never observe a half-applied change.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use intentmail_core::{Fingerprint, IntentName, IntentSnapshot};

use crate::directory::{Authorization, IntentDirectory};
use crate::error::{PermsError, Result};
use crate::intent::{Intent, IntentCatalog};

/// The intent directory of one identity, safe to share across tasks.
#[derive(Debug)]
pub struct IntentRegistry {
    inner: RwLock<IntentDirectory>,
}

impl IntentRegistry {
    /// A registry holding only the built-in `chat` intent.
    pub fn new(owner: Fingerprint) -> Self {
        Self::from_directory(IntentDirectory::new(owner))
    }

    pub fn from_directory(directory: IntentDirectory) -> Self {
        Self {
            inner: RwLock::new(directory),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, IntentDirectory> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IntentDirectory> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` atomically. On error the directory is left untouched.
    pub fn update<T>(&self, f: impl FnOnce(&mut IntentDirectory) -> Result<T>) -> Result<T> {
        let mut guard = self.write();
        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        *guard = draft;
        Ok(out)
    }

    /// Swap in a directory built elsewhere, typically a draft that has
    /// already been persisted. The owner must not change.
    pub fn replace(&self, directory: IntentDirectory) -> Result<()> {
        let mut guard = self.write();
        if directory.owner() != guard.owner() {
            return Err(PermsError::InvalidRequest(format!(
                "directory of {} cannot replace directory of {}",
                directory.owner(),
                guard.owner()
            )));
        }
        *guard = directory;
        Ok(())
    }

    pub fn declare_intent(
        &self,
        name: &str,
        description: impl Into<String>,
        privileged: bool,
    ) -> Result<Intent> {
        self.write().declare_intent(name, description, privileged)
    }

    pub fn remove_intent(&self, name: &str) -> Result<Intent> {
        self.write().remove_intent(name)
    }

    pub fn grant(&self, grantee: &Fingerprint, intent: &str) -> Result<bool> {
        self.write().grant(grantee, intent)
    }

    pub fn revoke(&self, grantee: &Fingerprint, intent: &str) -> Result<bool> {
        self.write().revoke(grantee, intent)
    }

    pub fn authorize(
        &self,
        sender: &Fingerprint,
        requested: &[IntentName],
    ) -> Result<Authorization> {
        self.read().authorize(sender, requested)
    }

    /// A consistent copy of the whole directory.
    pub fn snapshot(&self) -> IntentDirectory {
        self.read().clone()
    }

    pub fn view_for(&self, sender: &Fingerprint) -> IntentDirectory {
        self.read().view_for(sender)
    }

    pub fn catalog(&self) -> IntentCatalog {
        self.read().catalog().clone()
    }

    pub fn intents(&self) -> Vec<Intent> {
        self.read().intents()
    }

    pub fn snapshots(&self, requested: &[IntentName]) -> Vec<IntentSnapshot> {
        self.read().snapshots(requested)
    }
}
