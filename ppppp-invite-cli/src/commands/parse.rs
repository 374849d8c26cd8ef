//! Parse command - decode an invite URI or display URL into its commands

use anyhow::{Context, Result};
use ppppp_invite::{Codec, Command, InviteConfig, ProtocolRevision};
use serde::Serialize;

use crate::ui;

/// A decoded command plus the address a client would dial for it.
#[derive(Debug, Serialize)]
pub struct CommandReport {
    #[serde(flatten)]
    pub command: Command,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiserver: Option<String>,
}

/// Everything `parse` reports about an invite.
#[derive(Debug, Serialize)]
pub struct ParsedInvite {
    pub uri: String,
    pub revision: ProtocolRevision,
    pub commands: Vec<CommandReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Decode `input` with the configured revision.
pub fn describe(config: &InviteConfig, input: &str) -> Result<ParsedInvite> {
    let uri = super::invite_uri_from_input(input)?;
    let codec = Codec::from_config(config);
    let commands = codec
        .parse(&uri)
        .with_context(|| format!("Failed to parse invite as {}", codec.revision()))?;
    let url = codec.display_url_for(&commands, &uri);

    Ok(ParsedInvite {
        revision: codec.revision(),
        commands: commands
            .into_iter()
            .map(|command| CommandReport {
                multiserver: command.multiserver_address(),
                command,
            })
            .collect(),
        url,
        uri,
    })
}

#[tracing::instrument(skip(config))]
pub fn run(config: &InviteConfig, input: &str, json: bool, verbose: bool) -> Result<()> {
    let parsed = describe(config, input)?;
    tracing::debug!(commands = parsed.commands.len(), "parsed invite");

    if json {
        ui::json(&parsed)?;
        return Ok(());
    }

    ui::header("Invite");
    ui::key_value("Revision", parsed.revision.as_str());
    if verbose {
        ui::key_value("URI", &parsed.uri);
        if let Some(url) = &parsed.url {
            ui::key_value("URL", url);
        }
    }

    if parsed.commands.is_empty() {
        ui::info("Invite carries no commands");
        return Ok(());
    }

    for (index, report) in parsed.commands.iter().enumerate() {
        ui::separator();
        println!("{}. {}", index + 1, report.command.label());
        print_command(&report.command);
        if let Some(address) = &report.multiserver {
            ui::key_value("dial", address);
        }
    }

    Ok(())
}

fn print_command(command: &Command) {
    match command {
        Command::Join(join) => {
            ui::key_value("host", &format!("{}/{}", join.host_format, join.host));
            ui::key_value("port", &join.port.to_string());
            ui::key_value("pubkey", &join.pubkey);
            ui::key_value("token", join.token.as_deref().unwrap_or("(none)"));
        }
        Command::Follow { id } => ui::key_value("id", id),
        Command::TunnelConnect(tunnel) => {
            ui::key_value("hub", &tunnel.hub_pubkey);
            ui::key_value("target", &tunnel.target_pubkey);
        }
        Command::PromiseFollow(promise) | Command::PromiseAccountAdd(promise) => {
            ui::key_value(
                "issuer",
                &format!("{}.{}", promise.issuer_kind, promise.issuer_id),
            );
            ui::key_value("token", &promise.token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_reports_dial_addresses() {
        let parsed = describe(
            &InviteConfig::default(),
            "ppppp://invite/join/dns/example.com/tcp/8080/shse/PUBKEY.TOKEN/follow/ALICE",
        )
        .unwrap();

        assert_eq!(parsed.commands.len(), 2);
        assert_eq!(
            parsed.commands[0].multiserver.as_deref(),
            Some("net:example.com:8080~shse:PUBKEY:TOKEN")
        );
        assert!(parsed.commands[1].multiserver.is_none());
        assert!(parsed.url.unwrap().starts_with("https://example.com/invite#"));
    }

    #[test]
    fn test_describe_json_shape() {
        let parsed = describe(&InviteConfig::default(), "ppppp://invite/follow/ALICE").unwrap();
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["revision"], "v3");
        assert_eq!(json["commands"][0]["type"], "follow");
        assert_eq!(json["commands"][0]["id"], "ALICE");
        assert!(json.get("url").is_none());
    }

    #[test]
    fn test_describe_uses_configured_revision() {
        let uri = "ppppp://invite/join/example.com/8008/HUB_PUBKEY/MOCK_TOKEN";
        assert!(describe(&InviteConfig::default(), uri).is_err());
        assert!(describe(&InviteConfig::new(ProtocolRevision::V1), uri).is_ok());
    }
}
