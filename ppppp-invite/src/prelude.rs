//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use ppppp_invite::prelude::*;
//! ```

// Commands and codec
pub use crate::command::{Command, HostFormat, IssuerKind, JoinAddress, PromiseCommand, TunnelAddress};
pub use crate::revision::{ProtocolRevision, UnknownCommandPolicy};
pub use crate::uri::{parse_uri, Codec};

// Error handling
pub use crate::errors::{InviteError, InviteErrorCode};
pub use crate::Result;

// Builder
pub use crate::builder::{Invitation, InvitationBuilder, InviteOptions};
pub use crate::config::InviteConfig;

// Collaborator traits
pub use crate::collaborators::{
    Collaborators, Connector, HubDirectory, HubRpc, LocalIdentity, PromiseService, PromiseSpec,
};
