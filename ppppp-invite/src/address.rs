//! Hub address parsing.
//!
//! Hub addresses reach the builder from two historical notations:
//!
//! - multiaddr: `/dns/example.com/tcp/8008/shse/PUBKEY`
//! - multiserver: `net:example.com:8008~shse:PUBKEY`
//!
//! Both are reduced to a [`HubAddress`], which becomes a [`JoinAddress`] once the
//! hub has issued a one-time token.

use std::str::FromStr;

use crate::command::{HostFormat, JoinAddress, Transform, Transport};

/// Reasons a hub address is unusable for an invite.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("unrecognized hub address format: {0}")]
    UnrecognizedFormat(String),

    #[error("hub address {0} has no shse credential")]
    MissingCredential(String),

    #[error("hub address {address} is invalid: {reason}")]
    Invalid { address: String, reason: String },

    /// The address parsed, but the join it produces cannot be written in the
    /// selected revision.
    #[error("join for hub {address} cannot be encoded: {reason}")]
    Unencodable { address: String, reason: String },
}

impl AddressError {
    fn invalid(address: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            address: address.to_string(),
            reason: reason.into(),
        }
    }
}

/// A hub reachable over TCP with an shse public key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HubAddress {
    pub host_format: HostFormat,
    pub host: String,
    pub port: u16,
    pub pubkey: String,
}

impl HubAddress {
    /// Join address for this hub carrying `token`.
    pub fn into_join(self, token: impl Into<String>) -> JoinAddress {
        JoinAddress::new(self.host_format, self.host, self.port, self.pubkey).with_token(token)
    }

    fn parse_multiaddr(address: &str) -> Result<Self, AddressError> {
        let parts: Vec<&str> = address.trim_start_matches('/').split('/').collect();
        if parts.len() < 4 {
            return Err(AddressError::invalid(
                address,
                "expected /<format>/<host>/tcp/<port>",
            ));
        }
        let host_format = HostFormat::from_label(parts[0]).ok_or_else(|| {
            AddressError::invalid(address, format!("unsupported host format \"{}\"", parts[0]))
        })?;
        let host = parts[1];
        if !host_format.accepts(host) {
            return Err(AddressError::invalid(
                address,
                format!("incoherent host \"{}/{}\"", host_format, host),
            ));
        }
        if Transport::from_label(parts[2]).is_none() {
            return Err(AddressError::invalid(
                address,
                format!("unsupported transport \"{}\"", parts[2]),
            ));
        }
        let port = parse_port(address, parts[3])?;

        let pubkey = match (parts.get(4), parts.get(5)) {
            (Some(transform), Some(credential))
                if Transform::from_label(transform).is_some() && !credential.is_empty() =>
            {
                credential_pubkey(credential)
            }
            _ => return Err(AddressError::MissingCredential(address.to_string())),
        };

        Ok(Self {
            host_format,
            host: host.to_string(),
            port,
            pubkey,
        })
    }

    fn parse_multiserver(address: &str) -> Result<Self, AddressError> {
        // Only the first of several `;`-separated alternatives is considered.
        let first = address.split(';').next().unwrap_or(address);
        let mut layers = first.split('~');
        let net = layers
            .next()
            .and_then(|net| net.strip_prefix("net:"))
            .ok_or_else(|| AddressError::UnrecognizedFormat(address.to_string()))?;
        let (host, port) = net
            .rsplit_once(':')
            .ok_or_else(|| AddressError::invalid(address, "expected net:<host>:<port>"))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(AddressError::invalid(address, "empty host"));
        }
        let port = parse_port(address, port)?;

        let pubkey = layers
            .find_map(|layer| layer.strip_prefix("shse:"))
            .filter(|credential| !credential.is_empty())
            .map(credential_pubkey)
            .ok_or_else(|| AddressError::MissingCredential(address.to_string()))?;

        Ok(Self {
            host_format: HostFormat::infer(host),
            host: host.to_string(),
            port,
            pubkey,
        })
    }
}

impl FromStr for HubAddress {
    type Err = AddressError;

    fn from_str(address: &str) -> Result<Self, Self::Err> {
        let address = address.trim();
        if address.starts_with('/') {
            Self::parse_multiaddr(address)
        } else if address.starts_with("net:") {
            Self::parse_multiserver(address)
        } else {
            Err(AddressError::UnrecognizedFormat(address.to_string()))
        }
    }
}

fn parse_port(address: &str, port: &str) -> Result<u16, AddressError> {
    port.parse::<u16>()
        .map_err(|_| AddressError::invalid(address, format!("invalid port \"{}\"", port)))
}

/// The pubkey part of a credential that may already carry a token.
fn credential_pubkey(credential: &str) -> String {
    credential
        .split(&['.', ':'][..])
        .next()
        .unwrap_or(credential)
        .to_string()
}
