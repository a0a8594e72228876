//! Agent configuration.

use serde::{Deserialize, Serialize};

use intentmail_core::{validate_agent_id, ContentFormat};

use crate::error::{AgentError, Result};

/// Configuration for an [`Agent`](crate::Agent).
///
/// Persisted through the store so an agent reopens with the same settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    /// Relay handle, also the local identity id in the store.
    pub agent_id: String,

    /// Name shown to recipients.
    pub display_name: Option<String>,

    /// Check the recipient's intents before encrypting. The relay checks
    /// again either way.
    pub precheck_intents: bool,

    /// Format used by [`Agent::send_text`](crate::Agent::send_text).
    pub default_format: ContentFormat,
}

impl AgentConfig {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            ..Self::default()
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Check the handle format.
    pub fn validate(&self) -> Result<()> {
        validate_agent_id(&self.agent_id)
            .map_err(|e| AgentError::InvalidInput(format!("agent id: {e}")))?;
        if matches!(&self.display_name, Some(name) if name.trim().is_empty()) {
            return Err(AgentError::InvalidInput(
                "display name must not be blank".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_id: String::new(),
            display_name: None,
            precheck_intents: true,
            default_format: ContentFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::new("alice");
        assert!(config.precheck_intents);
        assert_eq!(config.default_format, ContentFormat::Text);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_handles() {
        assert!(AgentConfig::default().validate().is_err());
        assert!(AgentConfig::new("has space").validate().is_err());
        assert!(AgentConfig::new("alice")
            .with_display_name("  ")
            .validate()
            .is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AgentConfig =
            serde_json::from_str(r#"{"agentId": "alice", "defaultFormat": "markdown"}"#).unwrap();
        assert_eq!(config.agent_id, "alice");
        assert!(config.precheck_intents);
        assert_eq!(config.default_format, ContentFormat::Markdown);
    }
}
