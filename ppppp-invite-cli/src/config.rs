//! Configuration loading for the CLI.

use anyhow::{Context, Result};
use ppppp_invite::{InviteConfig, ProtocolRevision, UnknownCommandPolicy};
use std::path::{Path, PathBuf};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "PPPPP_INVITE_CONFIG";

/// Load the config from `path`, falling back to `$PPPPP_INVITE_CONFIG`, then defaults.
pub fn load(path: Option<&Path>) -> Result<InviteConfig> {
    let path: Option<PathBuf> = match path {
        Some(path) => Some(path.to_path_buf()),
        None => std::env::var_os(CONFIG_ENV).map(PathBuf::from),
    };

    let Some(path) = path else {
        tracing::debug!("no config file, using defaults");
        return Ok(InviteConfig::default());
    };

    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = InviteConfig::from_json_str(&json)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    tracing::debug!(path = %path.display(), revision = %config.revision, "loaded config");
    Ok(config)
}

/// Apply command-line overrides on top of a loaded config.
pub fn apply_overrides(
    mut config: InviteConfig,
    revision: Option<ProtocolRevision>,
    skip_unknown: bool,
) -> InviteConfig {
    if let Some(revision) = revision {
        config.revision = revision;
    }
    if skip_unknown {
        config.unknown_commands = Some(UnknownCommandPolicy::Skip);
    }
    config
}
