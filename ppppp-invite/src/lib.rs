//! ppppp invite library.
//!
//! Invite URIs bootstrap a new peer into the network: they tell it which hub
//! to join, which account to follow or which device to tunnel back to, and
//! which promise to redeem once connected. This crate parses and encodes those
//! URIs and builds new ones by negotiating join tokens with hubs.
//!
//! The builder never talks to the network directly. Connections, hub
//! discovery, promise minting and the local identity are supplied by the
//! caller through the traits in [`collaborators`].
//!
//! # Features
//!
//! - **Command Codec**: `ppppp://invite/...` URIs to ordered [`Command`]s and back
//! - **Protocol Revisions**: one grammar strategy per historical URI revision
//! - **Invitation Builder**: multi-hub negotiation with per-hub failure aggregation
//!
//! # Example
//!
//! ```
//! use ppppp_invite::{parse_uri, Command};
//!
//! let commands = parse_uri(
//!     "ppppp://invite/join/dns/example.com/tcp/8080/shse/PUBKEY.TOKEN/follow/ALICE",
//! )?;
//! assert!(matches!(&commands[0], Command::Join(join) if join.token.as_deref() == Some("TOKEN")));
//! assert_eq!(commands[1].label(), "follow");
//! # Ok::<(), ppppp_invite::InviteError>(())
//! ```

pub mod address;
pub mod builder;
pub mod collaborators;
pub mod command;
pub mod config;
pub mod errors;
pub mod prelude;
pub mod revision;
pub mod uri;

/// Mock collaborators and fixtures.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use address::{AddressError, HubAddress};
pub use builder::{Invitation, InvitationBuilder, InviteOptions};
pub use collaborators::{
    CollaboratorError, CollaboratorResult, Collaborators, Connector, HubDirectory, HubRpc,
    LocalIdentity, PromiseKind, PromiseService, PromiseSpec,
};
pub use command::{
    Command, HostFormat, IssuerKind, JoinAddress, PromiseCommand, Transform, Transport,
    TunnelAddress,
};
pub use config::InviteConfig;
pub use errors::{HubFailure, HubFailureCause, HubFailures, HubStage, InviteError, InviteErrorCode};
pub use revision::{ProtocolRevision, RevisionStrategy, UnknownCommandPolicy};
pub use uri::{display_url, encode_uri, parse_uri, uri_from_display_url, Codec, UrlScheme};

/// Common result alias for invite operations.
pub type Result<T> = std::result::Result<T, InviteError>;
