//! Configuration for the codec and the invitation builder.

use serde::{Deserialize, Serialize};

use crate::revision::{ProtocolRevision, UnknownCommandPolicy};
use crate::{InviteError, Result};

/// Settings shared by [`Codec`](crate::uri::Codec) and
/// [`InvitationBuilder`](crate::builder::InvitationBuilder).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InviteConfig {
    /// Protocol revision used to parse and encode URIs.
    pub revision: ProtocolRevision,

    /// Hubs requested from the directory when the caller does not say.
    pub default_hubs: usize,

    /// Overrides the revision's handling of unrecognized command labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown_commands: Option<UnknownCommandPolicy>,

    /// Negotiate with all candidate hubs at once instead of one after another.
    pub concurrent_negotiation: bool,
}

fn default_hubs() -> usize {
    1
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            revision: ProtocolRevision::default(),
            default_hubs: default_hubs(),
            unknown_commands: None,
            concurrent_negotiation: false,
        }
    }
}

impl InviteConfig {
    /// Default configuration for `revision`.
    pub fn new(revision: ProtocolRevision) -> Self {
        Self {
            revision,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| InviteError::Config(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_hubs == 0 {
            return Err(InviteError::Config(
                "default_hubs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Policy in effect, falling back to the revision default.
    pub fn unknown_commands_policy(&self) -> UnknownCommandPolicy {
        self.unknown_commands
            .unwrap_or_else(|| self.revision.strategy().unknown_commands())
    }

    pub fn with_default_hubs(mut self, hubs: usize) -> Self {
        self.default_hubs = hubs;
        self
    }

    pub fn with_unknown_commands(mut self, policy: UnknownCommandPolicy) -> Self {
        self.unknown_commands = Some(policy);
        self
    }

    pub fn with_concurrent_negotiation(mut self, enabled: bool) -> Self {
        self.concurrent_negotiation = enabled;
        self
    }
}
