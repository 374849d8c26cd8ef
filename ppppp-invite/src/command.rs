//! Typed invite commands.
//!
//! A [`Command`] is the in-memory form of one slash-delimited command inside an
//! invite URI. Commands are produced by [`Codec::parse`](crate::uri::Codec::parse)
//! or assembled by the [`InvitationBuilder`](crate::builder::InvitationBuilder)
//! right before encoding, and are dropped once dispatched or serialized.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Host encoding used by a join address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostFormat {
    /// IPv4 literal.
    Ip4,
    /// IPv6 literal.
    Ip6,
    /// DNS name; must contain at least one dot.
    Dns,
}

impl HostFormat {
    /// Wire tag for this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ip4 => "ip4",
            Self::Ip6 => "ip6",
            Self::Dns => "dns",
        }
    }

    /// Look up a format by its wire tag.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "ip4" => Some(Self::Ip4),
            "ip6" => Some(Self::Ip6),
            "dns" => Some(Self::Dns),
            _ => None,
        }
    }

    /// Infer the format of a bare host literal.
    ///
    /// Anything that is not an IP literal is treated as a DNS name.
    pub fn infer(host: &str) -> Self {
        if host.parse::<Ipv4Addr>().is_ok() {
            Self::Ip4
        } else if host.parse::<Ipv6Addr>().is_ok() {
            Self::Ip6
        } else {
            Self::Dns
        }
    }

    /// Returns true if `host` is coherent with this format.
    pub fn accepts(&self, host: &str) -> bool {
        match self {
            Self::Ip4 => host.parse::<Ipv4Addr>().is_ok(),
            Self::Ip6 => host.parse::<Ipv6Addr>().is_ok(),
            Self::Dns => host.contains('.'),
        }
    }
}

impl fmt::Display for HostFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport tag of a join address. Only TCP is supported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Tcp,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "tcp" => Some(Self::Tcp),
            _ => None,
        }
    }

    /// Name of the matching multiserver plugin.
    fn multiserver_name(&self) -> &'static str {
        match self {
            Self::Tcp => "net",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secure transform tag of a join address. Only the `shse` handshake is supported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    #[default]
    Shse,
}

impl Transform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shse => "shse",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "shse" => Some(Self::Shse),
            _ => None,
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to reach and authenticate with a hub.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinAddress {
    pub host_format: HostFormat,
    pub host: String,
    #[serde(default)]
    pub transport: Transport,
    pub port: u16,
    #[serde(default)]
    pub transform: Transform,
    /// Hub public key for the secure handshake.
    pub pubkey: String,
    /// One-time join token issued by the hub, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl JoinAddress {
    /// Create a tokenless TCP + shse join address.
    pub fn new(
        host_format: HostFormat,
        host: impl Into<String>,
        port: u16,
        pubkey: impl Into<String>,
    ) -> Self {
        Self {
            host_format,
            host: host.into(),
            transport: Transport::Tcp,
            port,
            transform: Transform::Shse,
            pubkey: pubkey.into(),
            token: None,
        }
    }

    /// Attach a one-time join token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Multiserver form handed to the connection layer when dispatching a join,
    /// e.g. `net:example.com:8008~shse:PUBKEY:TOKEN`.
    pub fn to_multiserver(&self) -> String {
        let mut shse = format!("{}:{}", self.transform, self.pubkey);
        if let Some(token) = &self.token {
            shse.push(':');
            shse.push_str(token);
        }
        format!(
            "{}:{}:{}~{}",
            self.transport.multiserver_name(),
            self.host,
            self.port,
            shse
        )
    }
}

/// A relayed address to a target peer, routed through a hub.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TunnelAddress {
    pub hub_pubkey: String,
    pub target_pubkey: String,
}

impl TunnelAddress {
    pub fn new(hub_pubkey: impl Into<String>, target_pubkey: impl Into<String>) -> Self {
        Self {
            hub_pubkey: hub_pubkey.into(),
            target_pubkey: target_pubkey.into(),
        }
    }

    /// Multiserver form, e.g. `tunnel:HUB:TARGET~shse:TARGET`.
    pub fn to_multiserver(&self) -> String {
        format!(
            "tunnel:{}:{}~shse:{}",
            self.hub_pubkey, self.target_pubkey, self.target_pubkey
        )
    }
}

/// Kind of identifier naming the issuer of a promise.
///
/// Each protocol revision accepts exactly one kind; see
/// [`RevisionStrategy::issuer_kind`](crate::revision::RevisionStrategy::issuer_kind).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssuerKind {
    Identity,
    Account,
    Pubkey,
}

impl IssuerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Account => "account",
            Self::Pubkey => "pubkey",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "identity" => Some(Self::Identity),
            "account" => Some(Self::Account),
            "pubkey" => Some(Self::Pubkey),
            _ => None,
        }
    }
}

impl fmt::Display for IssuerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Redeemable proof that an issuer authorized a future action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromiseCommand {
    pub issuer_kind: IssuerKind,
    pub issuer_id: String,
    pub token: String,
}

impl PromiseCommand {
    pub fn new(
        issuer_kind: IssuerKind,
        issuer_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            issuer_kind,
            issuer_id: issuer_id.into(),
            token: token.into(),
        }
    }
}

/// One bootstrap command carried by an invite URI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Join a hub.
    #[serde(rename = "join")]
    Join(JoinAddress),
    /// Follow an account.
    #[serde(rename = "follow")]
    Follow { id: String },
    /// Reach a peer through a hub-mediated tunnel.
    #[serde(rename = "tunnel-connect")]
    TunnelConnect(TunnelAddress),
    /// Redeem a follow promise.
    #[serde(rename = "promise.follow")]
    PromiseFollow(PromiseCommand),
    /// Redeem an account-add promise.
    #[serde(rename = "promise.account-add")]
    PromiseAccountAdd(PromiseCommand),
}

impl Command {
    pub const JOIN: &'static str = "join";
    pub const FOLLOW: &'static str = "follow";
    pub const TUNNEL_CONNECT: &'static str = "tunnel-connect";
    pub const PROMISE_FOLLOW: &'static str = "promise.follow";
    pub const PROMISE_ACCOUNT_ADD: &'static str = "promise.account-add";

    /// The wire label this command starts with.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Join(_) => Self::JOIN,
            Self::Follow { .. } => Self::FOLLOW,
            Self::TunnelConnect(_) => Self::TUNNEL_CONNECT,
            Self::PromiseFollow(_) => Self::PROMISE_FOLLOW,
            Self::PromiseAccountAdd(_) => Self::PROMISE_ACCOUNT_ADD,
        }
    }

    /// Multiserver address to dial when dispatching this command, if it has one.
    pub fn multiserver_address(&self) -> Option<String> {
        match self {
            Self::Join(address) => Some(address.to_multiserver()),
            Self::TunnelConnect(tunnel) => Some(tunnel.to_multiserver()),
            _ => None,
        }
    }
}
