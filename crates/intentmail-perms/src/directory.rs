//! Per-identity intent directory and the authorization decision.
//!
//! An [`IntentDirectory`] holds everything one identity decides about who
//! may address it: the declared intents and the grants it has issued.
//! [`IntentDirectory::authorize`] is the single decision procedure used both
//! by a sender's local pre-check and by the relay's authoritative check.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use intentmail_core::{Fingerprint, IntentName, IntentSnapshot};

use crate::error::{PermsError, Result};
use crate::grant::PermissionGrant;
use crate::intent::{self, Intent, IntentCatalog, IntentSpec, DEFAULT_INTENT_DESCRIPTION};

/// Outcome of an authorization check.
///
/// A denial is a normal result, not an error. `blocked` keeps the order of
/// the request and lists each name once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    pub allowed: bool,
    #[serde(default)]
    pub blocked: Vec<IntentName>,
}

impl Authorization {
    fn from_blocked(blocked: Vec<IntentName>) -> Self {
        Self {
            allowed: blocked.is_empty(),
            blocked,
        }
    }

    /// Guidance for the sender when the check failed, `None` when allowed.
    pub fn bounce_message(&self, recipient: &str) -> Option<String> {
        if self.allowed {
            return None;
        }
        let names: Vec<&str> = self.blocked.iter().map(IntentName::as_str).collect();
        Some(format!(
            "ask {recipient} to grant you access to: {}",
            names.join(", ")
        ))
    }
}

/// The intents an identity accepts and the grants it has issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "DirectoryRecord")]
pub struct IntentDirectory {
    owner: Fingerprint,
    intents: IntentCatalog,
    grants: BTreeMap<Fingerprint, BTreeSet<IntentName>>,
}

impl IntentDirectory {
    /// A directory containing only the built-in public `chat` intent.
    pub fn new(owner: Fingerprint) -> Self {
        let mut intents = IntentCatalog::new();
        intents.insert(
            IntentName::chat(),
            IntentSpec::public(DEFAULT_INTENT_DESCRIPTION),
        );
        Self {
            owner,
            intents,
            grants: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> &Fingerprint {
        &self.owner
    }

    /// Declare or update an intent.
    ///
    /// Re-declaring an existing name replaces its description and privilege
    /// flag. `chat` may be re-described but never made privileged.
    pub fn declare_intent(
        &mut self,
        name: &str,
        description: impl Into<String>,
        privileged: bool,
    ) -> Result<Intent> {
        let name = parse_name(name)?;
        if name.is_default() && privileged {
            return Err(PermsError::ReservedIntent(name.to_string()));
        }

        let spec = IntentSpec {
            description: description.into(),
            privileged,
        };
        let intent = Intent::from_entry(&name, &spec);
        self.intents.insert(name, spec);
        Ok(intent)
    }

    /// Remove a declared intent.
    ///
    /// Grants for the name stay recorded; declaring it again re-activates
    /// them.
    pub fn remove_intent(&mut self, name: &str) -> Result<Intent> {
        let name = parse_name(name)?;
        if name.is_default() {
            return Err(PermsError::ReservedIntent(name.to_string()));
        }

        let spec = self
            .intents
            .remove(&name)
            .ok_or_else(|| PermsError::IntentNotFound(name.to_string()))?;
        Ok(Intent::from_entry(&name, &spec))
    }

    /// Record that `grantee` may use `intent`. Returns `false` if the grant
    /// already existed.
    ///
    /// The intent does not have to be declared or privileged yet.
    pub fn grant(&mut self, grantee: &Fingerprint, intent: &str) -> Result<bool> {
        let intent = parse_name(intent)?;
        Ok(self.grants.entry(grantee.clone()).or_default().insert(intent))
    }

    /// Remove a grant. Returns `false` if there was nothing to remove.
    pub fn revoke(&mut self, grantee: &Fingerprint, intent: &str) -> Result<bool> {
        let intent = parse_name(intent)?;
        let Some(held) = self.grants.get_mut(grantee) else {
            return Ok(false);
        };
        let removed = held.remove(&intent);
        if held.is_empty() {
            self.grants.remove(grantee);
        }
        Ok(removed)
    }

    pub fn has_grant(&self, grantee: &Fingerprint, intent: &IntentName) -> bool {
        self.grants
            .get(grantee)
            .is_some_and(|held| held.contains(intent))
    }

    /// Decide whether `sender` may send a message carrying `requested`.
    ///
    /// Undeclared names are blocked, public names are allowed, privileged
    /// names need a grant for that exact name. The message is allowed only
    /// if no name is blocked.
    pub fn authorize(
        &self,
        sender: &Fingerprint,
        requested: &[IntentName],
    ) -> Result<Authorization> {
        if requested.is_empty() {
            return Err(PermsError::InvalidRequest(
                "at least one intent is required".into(),
            ));
        }

        let mut blocked: Vec<IntentName> = Vec::new();
        for name in requested {
            let permitted = match self.intents.get(name) {
                None => false,
                Some(spec) if !spec.privileged => true,
                Some(_) => self.has_grant(sender, name),
            };
            if !permitted && !blocked.contains(name) {
                blocked.push(name.clone());
            }
        }

        Ok(Authorization::from_blocked(blocked))
    }

    /// This directory as seen by one sender: the full catalog, and only the
    /// grants held by that sender.
    pub fn view_for(&self, sender: &Fingerprint) -> IntentDirectory {
        let grants = self
            .grants
            .get(sender)
            .map(|held| BTreeMap::from([(sender.clone(), held.clone())]))
            .unwrap_or_default();

        Self {
            owner: self.owner.clone(),
            intents: self.intents.clone(),
            grants,
        }
    }

    /// The public `{name: {description, privileged}}` mapping.
    pub fn catalog(&self) -> &IntentCatalog {
        &self.intents
    }

    pub fn get(&self, name: &IntentName) -> Option<Intent> {
        self.intents
            .get(name)
            .map(|spec| Intent::from_entry(name, spec))
    }

    /// All declared intents, ordered by name.
    pub fn intents(&self) -> Vec<Intent> {
        self.intents
            .iter()
            .map(|(name, spec)| Intent::from_entry(name, spec))
            .collect()
    }

    /// Every recorded grant.
    pub fn grants(&self) -> Vec<PermissionGrant> {
        self.grants
            .iter()
            .flat_map(|(grantee, held)| {
                held.iter().map(move |intent| {
                    PermissionGrant::new(self.owner.clone(), grantee.clone(), intent.clone())
                })
            })
            .collect()
    }

    /// Intents `grantee` holds grants for.
    pub fn grants_for(&self, grantee: &Fingerprint) -> Vec<IntentName> {
        self.grants
            .get(grantee)
            .map(|held| held.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Envelope snapshots for the requested names.
    pub fn snapshots(&self, requested: &[IntentName]) -> Vec<IntentSnapshot> {
        intent::snapshots(&self.intents, requested)
    }
}

/// Decide whether `sender` may address the owner of `directory` with
/// `requested`.
pub fn authorize(
    sender: &Fingerprint,
    directory: &IntentDirectory,
    requested: &[IntentName],
) -> Result<Authorization> {
    directory.authorize(sender, requested)
}

fn parse_name(name: &str) -> Result<IntentName> {
    IntentName::new(name).map_err(|_| PermsError::InvalidIntentName(name.to_string()))
}

/// Serialized form, checked before it becomes a directory.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct DirectoryRecord {
    owner: Fingerprint,
    #[serde(default)]
    intents: IntentCatalog,
    #[serde(default)]
    grants: BTreeMap<Fingerprint, BTreeSet<IntentName>>,
}

impl TryFrom<DirectoryRecord> for IntentDirectory {
    type Error = String;

    fn try_from(record: DirectoryRecord) -> std::result::Result<Self, Self::Error> {
        let mut intents = record.intents;
        match intents.get(&IntentName::chat()) {
            Some(spec) if spec.privileged => {
                return Err("the chat intent cannot be privileged".to_string());
            }
            Some(_) => {}
            None => {
                intents.insert(
                    IntentName::chat(),
                    IntentSpec::public(DEFAULT_INTENT_DESCRIPTION),
                );
            }
        }

        let mut grants = record.grants;
        grants.retain(|_, held| !held.is_empty());

        Ok(Self {
            owner: record.owner,
            intents,
            grants,
        })
    }
}
