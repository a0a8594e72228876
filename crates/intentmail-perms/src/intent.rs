//! Intents: named message purposes an identity declares it will accept.
//!
//! Public intents are open to every sender. Privileged intents require an
//! explicit grant from the owner to the sender.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use intentmail_core::{IntentName, IntentSnapshot};

/// Description of the built-in intent.
pub const DEFAULT_INTENT_DESCRIPTION: &str = "General conversation";

/// What an owner declares about one of its intents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentSpec {
    pub description: String,
    #[serde(default)]
    pub privileged: bool,
}

impl IntentSpec {
    /// A public intent.
    pub fn public(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            privileged: false,
        }
    }

    /// A privileged intent.
    pub fn privileged(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            privileged: true,
        }
    }
}

/// The public mapping `{name: {description, privileged}}` a recipient
/// exposes through the relay.
pub type IntentCatalog = BTreeMap<IntentName, IntentSpec>;

/// A declared intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub name: IntentName,
    pub description: String,
    pub privileged: bool,
}

impl Intent {
    /// The built-in `chat` intent.
    pub fn chat() -> Self {
        Self {
            name: IntentName::chat(),
            description: DEFAULT_INTENT_DESCRIPTION.to_string(),
            privileged: false,
        }
    }

    /// The name + description pair carried in envelopes.
    pub fn snapshot(&self) -> IntentSnapshot {
        IntentSnapshot::new(self.name.clone(), self.description.clone())
    }

    pub fn spec(&self) -> IntentSpec {
        IntentSpec {
            description: self.description.clone(),
            privileged: self.privileged,
        }
    }

    pub(crate) fn from_entry(name: &IntentName, spec: &IntentSpec) -> Self {
        Self {
            name: name.clone(),
            description: spec.description.clone(),
            privileged: spec.privileged,
        }
    }
}

/// Snapshots for the requested names, taking descriptions from a catalog.
///
/// Undeclared names get an empty description; authorization blocks them
/// before an envelope is ever built.
pub fn snapshots(catalog: &IntentCatalog, requested: &[IntentName]) -> Vec<IntentSnapshot> {
    requested
        .iter()
        .map(|name| {
            let description = catalog
                .get(name)
                .map(|spec| spec.description.clone())
                .unwrap_or_default();
            IntentSnapshot::new(name.clone(), description)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_is_public() {
        let chat = Intent::chat();
        assert!(!chat.privileged);
        assert!(chat.name.is_default());
    }

    #[test]
    fn test_catalog_json_shape() {
        let mut catalog = IntentCatalog::new();
        catalog.insert(IntentName::new("admin").unwrap(), IntentSpec::privileged("Admin ops"));
        let json = serde_json::to_value(&catalog).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"admin": {"description": "Admin ops", "privileged": true}})
        );
    }

    #[test]
    fn test_spec_privileged_defaults_false() {
        let spec: IntentSpec = serde_json::from_str(r#"{"description": "x"}"#).unwrap();
        assert!(!spec.privileged);
    }

    #[test]
    fn test_snapshots_use_catalog_descriptions() {
        let mut catalog = IntentCatalog::new();
        catalog.insert(IntentName::new("task").unwrap(), IntentSpec::public("Work items"));
        let requested = vec![IntentName::new("task").unwrap(), IntentName::new("ghost").unwrap()];

        let snaps = snapshots(&catalog, &requested);
        assert_eq!(snaps[0].description, "Work items");
        assert_eq!(snaps[1].description, "");
    }
}
