//! URL command - turn an invite URI into its shareable display URL

use anyhow::{anyhow, Context, Result};
use ppppp_invite::{Codec, InviteConfig};

use crate::ui;

/// Display URL for `uri`, addressed to the hub of its first join.
pub fn display_url(config: &InviteConfig, uri: &str) -> Result<String> {
    let codec = Codec::from_config(config);
    let commands = codec
        .parse(uri)
        .with_context(|| format!("Failed to parse invite as {}", codec.revision()))?;
    codec
        .display_url_for(&commands, uri)
        .ok_or_else(|| anyhow!("Invite has no join command, so there is no hub to address"))
}

#[tracing::instrument(skip(config))]
pub fn run(config: &InviteConfig, uri: &str, qr: bool) -> Result<()> {
    let url = display_url(config, uri)?;

    if qr {
        ui::header("Invite URL");
        ui::qr_code(&url)?;
        ui::info(&url);
    } else {
        println!("{}", url);
    }
    Ok(())
}
