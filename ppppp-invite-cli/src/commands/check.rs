//! Check command - validate an invite URI and confirm it is canonical

use anyhow::{bail, Context, Result};
use ppppp_invite::{Codec, InviteConfig};

use crate::ui;

/// Outcome of checking a single URI.
#[derive(Debug, PartialEq, Eq)]
pub struct CheckReport {
    pub commands: usize,
    /// Re-encoded form, which differs from the input when it was not canonical.
    pub canonical: String,
}

impl CheckReport {
    pub fn is_canonical(&self, uri: &str) -> bool {
        self.canonical == uri
    }
}

pub fn check(config: &InviteConfig, uri: &str) -> Result<CheckReport> {
    let codec = Codec::from_config(config);
    let commands = codec
        .parse(uri)
        .with_context(|| format!("Invalid {} invite", codec.revision()))?;
    let canonical = codec
        .encode_uri(&commands)
        .context("Invite parsed but cannot be re-encoded")?;
    Ok(CheckReport {
        commands: commands.len(),
        canonical,
    })
}

#[tracing::instrument(skip(config))]
pub fn run(config: &InviteConfig, uri: &str) -> Result<()> {
    let report = check(config, uri)?;

    if !report.is_canonical(uri) {
        ui::warning("Invite is valid but not in canonical form");
        ui::key_value("canonical", &report.canonical);
        bail!("Invite is not canonical");
    }

    ui::success(&format!(
        "Valid {} invite with {} command(s)",
        config.revision, report.commands
    ));
    Ok(())
}
