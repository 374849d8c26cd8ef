//! Interfaces the invitation builder consumes.
//!
//! The builder never opens sockets or signs anything itself. It is handed
//! implementations of these traits and only sequences their calls. Real
//! applications wire them to their peer-to-peer stack; tests use the mocks in
//! [`test_utils`](crate::test_utils).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Error raised by a collaborator.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("connection to {target} failed: {reason}")]
    ConnectionFailed { target: String, reason: String },

    #[error("hub refused to issue a token: {0}")]
    TokenIssuance(String),

    #[error("hub directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("promise rejected: {0}")]
    PromiseRejected(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;

/// What a minted promise authorizes its bearer to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromiseKind {
    /// The issuer will follow the bearer back.
    Follow,
    /// The bearer may add a device to the issuer's account.
    AccountAdd,
}

/// Request handed to [`PromiseService::create`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromiseSpec {
    #[serde(rename = "type")]
    pub kind: PromiseKind,
    pub account: String,
}

impl PromiseSpec {
    pub fn follow(account: impl Into<String>) -> Self {
        Self {
            kind: PromiseKind::Follow,
            account: account.into(),
        }
    }

    pub fn account_add(account: impl Into<String>) -> Self {
        Self {
            kind: PromiseKind::AccountAdd,
            account: account.into(),
        }
    }
}

/// RPC surface of a connected hub.
#[async_trait]
pub trait HubRpc: Send + Sync {
    /// Ask the hub for a one-time join token.
    async fn create_token(&self) -> CollaboratorResult<String>;
}

/// Opens RPC sessions to hubs.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to the hub at `address` (multiaddr or multiserver notation).
    async fn connect(&self, address: &str) -> CollaboratorResult<Arc<dyn HubRpc>>;
}

/// Source of candidate hub addresses.
#[async_trait]
pub trait HubDirectory: Send + Sync {
    /// Up to `count` hub addresses, in preference order.
    async fn get_hubs(&self, count: usize) -> CollaboratorResult<Vec<String>>;
}

/// Mints promise tokens on behalf of the local account.
#[async_trait]
pub trait PromiseService: Send + Sync {
    async fn create(&self, spec: &PromiseSpec) -> CollaboratorResult<String>;
}

/// The local peer's identity.
pub trait LocalIdentity: Send + Sync {
    /// Public key of the local shse identity.
    fn pubkey(&self) -> String;
}

/// Set of collaborators handed to the builder.
///
/// Every field is optional so a caller can construct the set incrementally;
/// [`InvitationBuilder::new`](crate::builder::InvitationBuilder::new) checks
/// that the required ones are present.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub connector: Option<Arc<dyn Connector>>,
    pub hub_directory: Option<Arc<dyn HubDirectory>>,
    pub promise: Option<Arc<dyn PromiseService>>,
    pub identity: Option<Arc<dyn LocalIdentity>>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn with_hub_directory(mut self, directory: Arc<dyn HubDirectory>) -> Self {
        self.hub_directory = Some(directory);
        self
    }

    pub fn with_promise_service(mut self, promise: Arc<dyn PromiseService>) -> Self {
        self.promise = Some(promise);
        self
    }

    pub fn with_identity(mut self, identity: Arc<dyn LocalIdentity>) -> Self {
        self.identity = Some(identity);
        self
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("connector", &self.connector.is_some())
            .field("hub_directory", &self.hub_directory.is_some())
            .field("promise", &self.promise.is_some())
            .field("identity", &self.identity.is_some())
            .finish()
    }
}
