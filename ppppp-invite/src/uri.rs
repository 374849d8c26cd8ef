//! Invite URI codec.
//!
//! An invite URI is a fixed scheme and authority followed by a `/`-delimited
//! list of commands:
//!
//! ```text
//! ppppp://invite/<cmd1>/<cmd2>/.../<cmdN>
//! ```
//!
//! Every command starts with its label (`join`, `follow`, `tunnel-connect`,
//! `promise.follow`, `promise.account-add`) followed by a label-specific number
//! of pieces. The [`Codec`] is the single place where commands are parsed and
//! serialized; grammar that differs between protocol revisions is delegated to
//! the revision's [`RevisionStrategy`].
//!
//! # Examples
//!
//! ```rust
//! use ppppp_invite::uri::Codec;
//! use ppppp_invite::{Command, ProtocolRevision};
//!
//! let codec = Codec::new(ProtocolRevision::V3);
//! let commands = codec.parse("ppppp://invite/join/dns/example.com/tcp/8080/shse/PUBKEY/follow/ALICE")?;
//! assert_eq!(commands.len(), 2);
//! assert_eq!(commands[1], Command::Follow { id: "ALICE".into() });
//!
//! let uri = codec.encode_uri(&commands)?;
//! assert_eq!(uri, "ppppp://invite/join/dns/example.com/tcp/8080/shse/PUBKEY/follow/ALICE");
//! # Ok::<(), ppppp_invite::InviteError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::command::{Command, HostFormat, JoinAddress, PromiseCommand, TunnelAddress};
use crate::config::InviteConfig;
use crate::revision::{
    encodable_piece, required, ProtocolRevision, RevisionStrategy, UnknownCommandPolicy,
};
use crate::{InviteError, Result};

/// Fixed URI scheme, without the trailing colon.
pub const SCHEME: &str = "ppppp";

/// Fixed URI authority.
pub const AUTHORITY: &str = "invite";

/// Prefix shared by every invite URI.
pub const URI_PREFIX: &str = "ppppp://invite";

/// Scheme of the human-shareable display URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlScheme {
    Http,
    Https,
}

impl UrlScheme {
    /// `https` for DNS hosts, `http` for IP literals.
    pub fn for_host(host_format: HostFormat) -> Self {
        match host_format {
            HostFormat::Dns => Self::Https,
            HostFormat::Ip4 | HostFormat::Ip6 => Self::Http,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for UrlScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build `<scheme>://<host>/invite#<percent-encoded uri>`.
pub fn display_url(scheme: UrlScheme, host: &str, uri: &str) -> String {
    let host = if host.contains(':') {
        format!("[{}]", host)
    } else {
        host.to_string()
    };
    format!(
        "{}://{}/{}#{}",
        scheme,
        host,
        AUTHORITY,
        urlencoding::encode(uri)
    )
}

/// Recover the invite URI carried in the fragment of a display URL.
pub fn uri_from_display_url(url: &str) -> Result<String> {
    let (_, fragment) = url
        .split_once('#')
        .ok_or_else(|| InviteError::malformed(url, "display URL has no fragment"))?;
    let uri = urlencoding::decode(fragment).map_err(|err| {
        InviteError::malformed(url, format!("invalid percent encoding: {}", err))
    })?;
    Ok(uri.into_owned())
}

/// Parser and serializer for one protocol revision.
#[derive(Clone, Copy)]
pub struct Codec {
    strategy: &'static dyn RevisionStrategy,
    unknown_commands: UnknownCommandPolicy,
}

impl Codec {
    /// Codec for `revision` with the revision's own unknown-command policy.
    pub fn new(revision: ProtocolRevision) -> Self {
        let strategy = revision.strategy();
        Self {
            strategy,
            unknown_commands: strategy.unknown_commands(),
        }
    }

    pub fn from_config(config: &InviteConfig) -> Self {
        Self::new(config.revision).with_unknown_commands(config.unknown_commands_policy())
    }

    /// Override what happens to unrecognized command labels.
    pub fn with_unknown_commands(mut self, policy: UnknownCommandPolicy) -> Self {
        self.unknown_commands = policy;
        self
    }

    pub fn revision(&self) -> ProtocolRevision {
        self.strategy.revision()
    }

    pub fn strategy(&self) -> &'static dyn RevisionStrategy {
        self.strategy
    }

    pub fn unknown_commands(&self) -> UnknownCommandPolicy {
        self.unknown_commands
    }

    /// Parse an invite URI into its ordered commands.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid command; no partial result is returned.
    pub fn parse(&self, uri: &str) -> Result<Vec<Command>> {
        let path = split_path(uri)?;
        let pieces: Vec<&str> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('/').collect()
        };

        let mut commands = Vec::new();
        let mut cursor = 0;
        while let Some(&label) = pieces.get(cursor) {
            let args = &pieces[cursor + 1..];
            let (command, consumed) = match label {
                Command::JOIN => {
                    let (join, consumed) = self.strategy.parse_join(uri, args)?;
                    (Command::Join(join), consumed)
                }
                Command::FOLLOW => {
                    let id = required(uri, args, 0, label, "id")?;
                    (Command::Follow { id: id.to_string() }, 1)
                }
                Command::TUNNEL_CONNECT => {
                    let hub_pubkey = required(uri, args, 0, label, "hub pubkey")?;
                    let target_pubkey = required(uri, args, 1, label, "target pubkey")?;
                    (
                        Command::TunnelConnect(TunnelAddress::new(hub_pubkey, target_pubkey)),
                        2,
                    )
                }
                Command::PROMISE_FOLLOW => (
                    Command::PromiseFollow(self.parse_promise(uri, label, args)?),
                    2,
                ),
                Command::PROMISE_ACCOUNT_ADD => (
                    Command::PromiseAccountAdd(self.parse_promise(uri, label, args)?),
                    2,
                ),
                unknown => match self.unknown_commands {
                    UnknownCommandPolicy::Fail => {
                        return Err(InviteError::UnknownCommand {
                            uri: uri.to_string(),
                            command: unknown.to_string(),
                        })
                    }
                    UnknownCommandPolicy::Skip => {
                        tracing::warn!(command = unknown, "skipping unknown invite command");
                        cursor += 1;
                        continue;
                    }
                },
            };
            commands.push(command);
            cursor += 1 + consumed;
        }

        Ok(commands)
    }

    fn parse_promise(&self, uri: &str, label: &str, args: &[&str]) -> Result<PromiseCommand> {
        let issuer = required(uri, args, 0, label, "issuer")?;
        let token = required(uri, args, 1, label, "token")?;
        let issuer_id = self.strategy.parse_issuer(uri, label, issuer)?;
        Ok(PromiseCommand::new(
            self.strategy.issuer_kind(),
            issuer_id,
            token,
        ))
    }

    pub fn encode_join(&self, join: &JoinAddress) -> Result<String> {
        self.strategy.encode_join(join)
    }

    pub fn encode_follow(&self, id: &str) -> Result<String> {
        encodable_piece(Command::FOLLOW, "id", id)?;
        Ok(format!("{}/{}", Command::FOLLOW, id))
    }

    pub fn encode_tunnel_connect(&self, tunnel: &TunnelAddress) -> Result<String> {
        encodable_piece(Command::TUNNEL_CONNECT, "hub pubkey", &tunnel.hub_pubkey)?;
        encodable_piece(Command::TUNNEL_CONNECT, "target pubkey", &tunnel.target_pubkey)?;
        Ok(format!(
            "{}/{}/{}",
            Command::TUNNEL_CONNECT,
            tunnel.hub_pubkey,
            tunnel.target_pubkey
        ))
    }

    pub fn encode_promise_follow(&self, promise: &PromiseCommand) -> Result<String> {
        self.encode_promise(Command::PROMISE_FOLLOW, promise)
    }

    pub fn encode_promise_account_add(&self, promise: &PromiseCommand) -> Result<String> {
        self.encode_promise(Command::PROMISE_ACCOUNT_ADD, promise)
    }

    fn encode_promise(&self, label: &str, promise: &PromiseCommand) -> Result<String> {
        let issuer = self
            .strategy
            .encode_issuer(promise.issuer_kind, &promise.issuer_id)?;
        encodable_piece(label, "token", &promise.token)?;
        Ok(format!("{}/{}/{}", label, issuer, promise.token))
    }

    /// Serialize a single command into its path segments.
    pub fn encode_command(&self, command: &Command) -> Result<String> {
        match command {
            Command::Join(join) => self.encode_join(join),
            Command::Follow { id } => self.encode_follow(id),
            Command::TunnelConnect(tunnel) => self.encode_tunnel_connect(tunnel),
            Command::PromiseFollow(promise) => self.encode_promise_follow(promise),
            Command::PromiseAccountAdd(promise) => self.encode_promise_account_add(promise),
        }
    }

    /// Serialize commands into a full invite URI.
    pub fn encode_uri(&self, commands: &[Command]) -> Result<String> {
        let mut uri = String::from(URI_PREFIX);
        for command in commands {
            uri.push('/');
            uri.push_str(&self.encode_command(command)?);
        }
        Ok(uri)
    }

    /// Display URL pointing at the hub of `join`.
    pub fn display_url(&self, join: &JoinAddress, uri: &str) -> String {
        display_url(self.strategy.url_scheme(join.host_format), &join.host, uri)
    }

    /// Display URL for an already-parsed URI, using its first join command.
    pub fn display_url_for(&self, commands: &[Command], uri: &str) -> Option<String> {
        commands.iter().find_map(|command| match command {
            Command::Join(join) => Some(self.display_url(join, uri)),
            _ => None,
        })
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(ProtocolRevision::default())
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("revision", &self.revision())
            .field("unknown_commands", &self.unknown_commands)
            .finish()
    }
}

/// Parse an invite URI with the default revision.
pub fn parse_uri(uri: &str) -> Result<Vec<Command>> {
    Codec::default().parse(uri)
}

/// Encode commands with the default revision.
pub fn encode_uri(commands: &[Command]) -> Result<String> {
    Codec::default().encode_uri(commands)
}

/// Validate scheme and authority and return the path without its leading slash.
fn split_path(uri: &str) -> Result<&str> {
    let (scheme, rest) = uri
        .split_once(':')
        .ok_or_else(|| InviteError::malformed(uri, "missing scheme"))?;
    if scheme != SCHEME {
        return Err(InviteError::malformed(
            uri,
            format!("invalid protocol \"{}:\", expected \"{}:\"", scheme, SCHEME),
        ));
    }
    let rest = rest
        .strip_prefix("//")
        .ok_or_else(|| InviteError::malformed(uri, "missing \"//\" before host"))?;
    let (authority, path) = match rest.find('/') {
        Some(index) => rest.split_at(index),
        None => (rest, ""),
    };
    if authority != AUTHORITY {
        return Err(InviteError::malformed(
            uri,
            format!("invalid host \"{}\", expected \"{}\"", authority, AUTHORITY),
        ));
    }
    if path.contains(['?', '#']) {
        return Err(InviteError::malformed(
            uri,
            "unexpected query or fragment",
        ));
    }
    let path = path.strip_prefix('/').unwrap_or(path);
    Ok(path.strip_suffix('/').unwrap_or(path))
}
