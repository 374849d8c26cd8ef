//! Protocol revisions of the invite grammar.
//!
//! The invite format changed several times: the join command went from a flat
//! `host/port/pubkey/token` list to a multiaddr-like encoding, the credential
//! separator changed from `:` to `.`, and the promise issuer prefix moved from
//! `identity.` to `pubkey.` to `account.`. Each revision is a
//! [`RevisionStrategy`] that owns the parts of the grammar that differ. The
//! shared commands (`follow`, `tunnel-connect`) are handled by the codec itself.
//!
//! A revision only accepts its own forms. A v3 codec rejects a `pubkey:token`
//! credential and a v1 codec rejects an `account.` issuer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::command::{HostFormat, IssuerKind, JoinAddress, Transform, Transport};
use crate::uri::UrlScheme;
use crate::{InviteError, Result};

/// Selects one of the built-in [`RevisionStrategy`] implementations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolRevision {
    /// Flat join, `identity.` issuers, single hub.
    V1,
    /// Multiaddr join with `pubkey:token` credentials, `pubkey.` issuers, single hub.
    V2,
    /// Multiaddr join with `pubkey.token` credentials, `account.` issuers, many hubs.
    #[default]
    V3,
}

impl ProtocolRevision {
    pub const ALL: [ProtocolRevision; 3] = [Self::V1, Self::V2, Self::V3];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
        }
    }

    /// The grammar strategy for this revision.
    pub fn strategy(&self) -> &'static dyn RevisionStrategy {
        match self {
            Self::V1 => &FLAT,
            Self::V2 => &COLON_CREDENTIALS,
            Self::V3 => &DOT_CREDENTIALS,
        }
    }
}

impl fmt::Display for ProtocolRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolRevision {
    type Err = InviteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v2" | "2" => Ok(Self::V2),
            "v3" | "3" => Ok(Self::V3),
            other => Err(InviteError::Config(format!(
                "unknown protocol revision \"{}\", expected v1, v2 or v3",
                other
            ))),
        }
    }
}

/// What to do with a command label the revision does not recognize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCommandPolicy {
    /// Abort the parse with [`InviteError::UnknownCommand`].
    #[default]
    Fail,
    /// Log and skip the single unrecognized piece.
    Skip,
}

/// Shape of the `join` command in a revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinForm {
    /// `join/<host>/<port>/<pubkey>/<token>`
    Flat,
    /// `join/<format>/<host>/tcp/<port>/shse/<pubkey>[<separator><token>]`
    Multiaddr { separator: char },
}

/// Per-revision parts of the invite grammar.
///
/// `parse_*` methods receive the pieces that follow the command label and
/// return how many of them they consumed. They never look past what they need.
pub trait RevisionStrategy: Send + Sync {
    fn revision(&self) -> ProtocolRevision;

    fn join_form(&self) -> JoinForm;

    /// The only issuer kind accepted in promise commands.
    fn issuer_kind(&self) -> IssuerKind;

    /// Upper bound on hubs negotiated per invite, `None` if unbounded.
    fn max_hubs(&self) -> Option<usize>;

    fn unknown_commands(&self) -> UnknownCommandPolicy {
        UnknownCommandPolicy::Fail
    }

    /// Scheme of the human-shareable URL for a hub with `host_format`.
    fn url_scheme(&self, host_format: HostFormat) -> UrlScheme {
        UrlScheme::for_host(host_format)
    }

    fn parse_join(&self, uri: &str, args: &[&str]) -> Result<(JoinAddress, usize)>;

    fn encode_join(&self, join: &JoinAddress) -> Result<String>;

    /// Parse a `<kind>.<id>` issuer piece.
    fn parse_issuer(&self, uri: &str, command: &str, piece: &str) -> Result<String> {
        let (kind, id) = piece.split_once('.').unwrap_or((piece, ""));
        if IssuerKind::from_label(kind) != Some(self.issuer_kind()) {
            return Err(InviteError::malformed(
                uri,
                format!("invalid {} issuer type \"{}\"", command, kind),
            ));
        }
        if id.is_empty() {
            return Err(InviteError::malformed(
                uri,
                format!("missing {} issuer id", command),
            ));
        }
        Ok(id.to_string())
    }

    fn encode_issuer(&self, kind: IssuerKind, id: &str) -> Result<String> {
        if kind != self.issuer_kind() {
            return Err(InviteError::Unsupported(format!(
                "issuer kind \"{}\" is not valid in revision {}, expected \"{}\"",
                kind,
                self.revision(),
                self.issuer_kind()
            )));
        }
        encodable_piece("promise", "issuer id", id)?;
        Ok(format!("{}.{}", kind, id))
    }
}

/// Flat join grammar.
pub struct FlatRevision;

/// Multiaddr join grammar parameterized by credential separator and issuer kind.
pub struct MultiaddrRevision {
    revision: ProtocolRevision,
    separator: char,
    issuer_kind: IssuerKind,
    max_hubs: Option<usize>,
}

static FLAT: FlatRevision = FlatRevision;

static COLON_CREDENTIALS: MultiaddrRevision = MultiaddrRevision {
    revision: ProtocolRevision::V2,
    separator: ':',
    issuer_kind: IssuerKind::Pubkey,
    max_hubs: Some(1),
};

static DOT_CREDENTIALS: MultiaddrRevision = MultiaddrRevision {
    revision: ProtocolRevision::V3,
    separator: '.',
    issuer_kind: IssuerKind::Account,
    max_hubs: None,
};

impl RevisionStrategy for FlatRevision {
    fn revision(&self) -> ProtocolRevision {
        ProtocolRevision::V1
    }

    fn join_form(&self) -> JoinForm {
        JoinForm::Flat
    }

    fn issuer_kind(&self) -> IssuerKind {
        IssuerKind::Identity
    }

    fn max_hubs(&self) -> Option<usize> {
        Some(1)
    }

    // The flat grammar has no host-format tag, so the URL never claims TLS.
    fn url_scheme(&self, _host_format: HostFormat) -> UrlScheme {
        UrlScheme::Http
    }

    fn parse_join(&self, uri: &str, args: &[&str]) -> Result<(JoinAddress, usize)> {
        let host = required(uri, args, 0, "join", "host")?;
        let port = required(uri, args, 1, "join", "port")?;
        let pubkey = required(uri, args, 2, "join", "pubkey")?;
        let token = required(uri, args, 3, "join", "token")?;
        let port = parse_port(uri, port)?;

        let join = JoinAddress::new(HostFormat::infer(host), host, port, pubkey).with_token(token);
        Ok((join, 4))
    }

    fn encode_join(&self, join: &JoinAddress) -> Result<String> {
        let token = join.token.as_deref().ok_or_else(|| {
            InviteError::Unsupported("revision v1 requires a token in every join".to_string())
        })?;
        encodable_piece("join", "host", &join.host)?;
        encodable_piece("join", "pubkey", &join.pubkey)?;
        encodable_piece("join", "token", token)?;
        if HostFormat::infer(&join.host) != join.host_format {
            return Err(InviteError::Unsupported(format!(
                "revision v1 cannot express host \"{}\" as {}",
                join.host, join.host_format
            )));
        }
        Ok(format!(
            "join/{}/{}/{}/{}",
            join.host, join.port, join.pubkey, token
        ))
    }
}

impl RevisionStrategy for MultiaddrRevision {
    fn revision(&self) -> ProtocolRevision {
        self.revision
    }

    fn join_form(&self) -> JoinForm {
        JoinForm::Multiaddr {
            separator: self.separator,
        }
    }

    fn issuer_kind(&self) -> IssuerKind {
        self.issuer_kind
    }

    fn max_hubs(&self) -> Option<usize> {
        self.max_hubs
    }

    fn parse_join(&self, uri: &str, args: &[&str]) -> Result<(JoinAddress, usize)> {
        let host_format = required(uri, args, 0, "join", "host format")?;
        let host = required(uri, args, 1, "join", "host")?;
        let transport = required(uri, args, 2, "join", "transport")?;
        let port = required(uri, args, 3, "join", "port")?;
        let transform = required(uri, args, 4, "join", "transform")?;
        let credential = required(uri, args, 5, "join", "credential")?;

        let host_format = HostFormat::from_label(host_format).ok_or_else(|| {
            InviteError::malformed(
                uri,
                format!("unsupported \"join\" host format \"{}\"", host_format),
            )
        })?;
        if !host_format.accepts(host) {
            let reason = match host_format {
                HostFormat::Dns => "invalid",
                HostFormat::Ip4 | HostFormat::Ip6 => "incoherent",
            };
            return Err(InviteError::malformed(
                uri,
                format!("{} \"join\" host \"{}/{}\"", reason, host_format, host),
            ));
        }
        let transport = Transport::from_label(transport).ok_or_else(|| {
            InviteError::malformed(
                uri,
                format!("unsupported \"join\" transport \"{}\"", transport),
            )
        })?;
        let port = parse_port(uri, port)?;
        let transform = Transform::from_label(transform).ok_or_else(|| {
            InviteError::malformed(
                uri,
                format!("unsupported \"join\" transform \"{}\"", transform),
            )
        })?;
        let (pubkey, token) = self.split_credential(uri, credential)?;

        let join = JoinAddress {
            host_format,
            host: host.to_string(),
            transport,
            port,
            transform,
            pubkey: pubkey.to_string(),
            token: token.map(str::to_string),
        };
        Ok((join, 6))
    }

    fn encode_join(&self, join: &JoinAddress) -> Result<String> {
        encodable_piece("join", "host", &join.host)?;
        if !join.host_format.accepts(&join.host) {
            return Err(InviteError::Unsupported(format!(
                "host \"{}\" is not a valid {} host",
                join.host, join.host_format
            )));
        }
        encodable_piece("join", "pubkey", &join.pubkey)?;
        if let Some(token) = &join.token {
            encodable_piece("join", "token", token)?;
        }
        let foreign = if self.separator == '.' { ':' } else { '.' };
        if join.pubkey.contains([self.separator, foreign])
            || matches!(&join.token, Some(token) if token.contains(foreign))
        {
            return Err(InviteError::Unsupported(format!(
                "credential for hub {} cannot be written with separator '{}'",
                join.host, self.separator
            )));
        }
        let mut credential = join.pubkey.clone();
        if let Some(token) = &join.token {
            credential.push(self.separator);
            credential.push_str(token);
        }
        Ok(format!(
            "join/{}/{}/{}/{}/{}/{}",
            join.host_format, join.host, join.transport, join.port, join.transform, credential
        ))
    }
}

impl MultiaddrRevision {
    /// Split `pubkey[<sep>token]`, rejecting the other revision's separator.
    fn split_credential<'a>(
        &self,
        uri: &str,
        credential: &'a str,
    ) -> Result<(&'a str, Option<&'a str>)> {
        let foreign = if self.separator == '.' { ':' } else { '.' };
        if credential.contains(foreign) {
            return Err(InviteError::malformed(
                uri,
                format!(
                    "\"join\" credential uses separator '{}', revision {} expects '{}'",
                    foreign, self.revision, self.separator
                ),
            ));
        }
        match credential.split_once(self.separator) {
            None => Ok((credential, None)),
            Some((pubkey, token)) if !pubkey.is_empty() && !token.is_empty() => {
                Ok((pubkey, Some(token)))
            }
            Some(_) => Err(InviteError::malformed(
                uri,
                format!("invalid \"join\" credential \"{}\"", credential),
            )),
        }
    }
}

/// Characters that would split or truncate a path segment.
pub(crate) const RESERVED: [char; 3] = ['/', '?', '#'];

/// Ensure `value` can be written as a single non-empty path segment.
pub(crate) fn encodable_piece(command: &str, field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(InviteError::Unsupported(format!(
            "\"{}\" {} must not be empty",
            command, field
        )));
    }
    if let Some(reserved) = value.chars().find(|c| RESERVED.contains(c)) {
        return Err(InviteError::Unsupported(format!(
            "\"{}\" {} \"{}\" contains reserved character '{}'",
            command, field, value, reserved
        )));
    }
    Ok(())
}

/// Fetch the non-empty argument at `index`, or fail with a missing-argument error.
pub(crate) fn required<'a>(
    uri: &str,
    args: &[&'a str],
    index: usize,
    command: &str,
    field: &str,
) -> Result<&'a str> {
    match args.get(index) {
        Some(&piece) if !piece.is_empty() => Ok(piece),
        _ => Err(InviteError::malformed(
            uri,
            format!("missing \"{}\" argument: {}", command, field),
        )),
    }
}

fn parse_port(uri: &str, port: &str) -> Result<u16> {
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InviteError::malformed(
            uri,
            format!("invalid \"join\" port {}", port),
        ));
    }
    port.parse::<u16>().map_err(|_| {
        InviteError::malformed(uri, format!("\"join\" port {} is out of range", port))
    })
}
