//! Error types for invite parsing and invitation building.
//!
//! Codec failures ([`InviteError::MalformedUri`], [`InviteError::UnknownCommand`])
//! are always fatal. Per-hub failures are collected into [`HubFailures`] and only
//! surface as [`InviteError::AllHubsFailed`] when no hub could be used.

use std::fmt;

use crate::address::AddressError;
use crate::collaborators::CollaboratorError;

/// Error codes for FFI and mobile integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum InviteErrorCode {
    /// URI could not be parsed
    MalformedUri = 1000,
    /// URI contains an unrecognized command label
    UnknownCommand = 1001,
    /// Command cannot be expressed in the selected revision
    Unsupported = 1002,
    /// Invalid invite options
    Validation = 2000,
    /// Required collaborator was not provided
    MissingCapability = 2001,
    /// Invalid configuration
    Config = 2002,
    /// No candidate hubs
    NoHubsAvailable = 3000,
    /// Hub directory failed
    HubDirectory = 3001,
    /// Every candidate hub failed
    AllHubsFailed = 3002,
    /// Promise service failed
    PromiseMinting = 4000,
}

/// Comprehensive error type for invite operations.
#[derive(Debug, thiserror::Error)]
pub enum InviteError {
    /// Wrong scheme or authority, missing or invalid segments.
    #[error("invalid invite URI \"{uri}\": {reason}")]
    MalformedUri {
        /// The offending URI
        uri: String,
        /// What was wrong with it
        reason: String,
    },

    /// A command label the selected revision does not know.
    #[error("unknown command \"{command}\" in invite URI \"{uri}\"")]
    UnknownCommand {
        /// The offending URI
        uri: String,
        /// The unrecognized label
        command: String,
    },

    /// A command that the selected revision cannot encode.
    #[error("cannot encode command: {0}")]
    Unsupported(String),

    /// Invalid invite options. Raised before any network call.
    #[error("invalid invite options: {0}")]
    Validation(String),

    /// A collaborator needed for this operation was not provided.
    #[error("missing required capability: {0}")]
    MissingCapability(&'static str),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Hub resolution produced zero candidates.
    #[error("no hubs available to host the invite")]
    NoHubsAvailable,

    /// The hub directory could not be queried.
    #[error("hub directory failed: {0}")]
    HubDirectory(#[source] CollaboratorError),

    /// Every candidate hub failed to connect, issue a token, or had a bad address.
    #[error("could not obtain a join token from any hub: {0}")]
    AllHubsFailed(#[source] HubFailures),

    /// The promise service refused or failed to mint a promise.
    #[error("failed to mint promise: {0}")]
    PromiseMinting(#[source] CollaboratorError),
}

impl InviteError {
    /// Get the error code for FFI/mobile integration.
    pub fn code(&self) -> InviteErrorCode {
        match self {
            Self::MalformedUri { .. } => InviteErrorCode::MalformedUri,
            Self::UnknownCommand { .. } => InviteErrorCode::UnknownCommand,
            Self::Unsupported(_) => InviteErrorCode::Unsupported,
            Self::Validation(_) => InviteErrorCode::Validation,
            Self::MissingCapability(_) => InviteErrorCode::MissingCapability,
            Self::Config(_) => InviteErrorCode::Config,
            Self::NoHubsAvailable => InviteErrorCode::NoHubsAvailable,
            Self::HubDirectory(_) => InviteErrorCode::HubDirectory,
            Self::AllHubsFailed(_) => InviteErrorCode::AllHubsFailed,
            Self::PromiseMinting(_) => InviteErrorCode::PromiseMinting,
        }
    }

    /// Returns true if calling again later may succeed.
    ///
    /// The builder itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NoHubsAvailable
                | Self::HubDirectory(_)
                | Self::AllHubsFailed(_)
                | Self::PromiseMinting(_)
        )
    }

    /// Per-hub causes when every hub failed.
    pub fn hub_failures(&self) -> Option<&HubFailures> {
        match self {
            Self::AllHubsFailed(failures) => Some(failures),
            _ => None,
        }
    }

    /// Create a malformed-URI error.
    pub fn malformed(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }
}

/// Step of the per-hub negotiation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubStage {
    Connect,
    CreateToken,
    Address,
}

impl fmt::Display for HubStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => f.write_str("connect"),
            Self::CreateToken => f.write_str("token creation"),
            Self::Address => f.write_str("join address"),
        }
    }
}

/// Underlying cause of a per-hub failure.
#[derive(Debug, thiserror::Error)]
pub enum HubFailureCause {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error(transparent)]
    Address(#[from] AddressError),
}

/// A single hub that could not be used.
#[derive(Debug, thiserror::Error)]
#[error("hub {address} failed during {stage}: {cause}")]
pub struct HubFailure {
    /// Hub address as returned by the directory or supplied by the caller
    pub address: String,
    pub stage: HubStage,
    #[source]
    pub cause: HubFailureCause,
}

impl HubFailure {
    pub fn new(address: impl Into<String>, stage: HubStage, cause: impl Into<HubFailureCause>) -> Self {
        Self {
            address: address.into(),
            stage,
            cause: cause.into(),
        }
    }
}

/// Aggregate of per-hub failures, in hub-candidate order.
#[derive(Debug, Default)]
pub struct HubFailures(Vec<HubFailure>);

impl HubFailures {
    pub fn new(failures: Vec<HubFailure>) -> Self {
        Self(failures)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HubFailure> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<HubFailure> {
        self.0
    }
}

impl<'a> IntoIterator for &'a HubFailures {
    type Item = &'a HubFailure;
    type IntoIter = std::slice::Iter<'a, HubFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for HubFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hub(s) failed", self.0.len())?;
        for failure in &self.0 {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for HubFailures {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0
            .first()
            .map(|failure| failure as &(dyn std::error::Error + 'static))
    }
}
