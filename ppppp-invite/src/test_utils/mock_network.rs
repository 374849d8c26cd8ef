//! Mock hubs, hub directory, promise service and identity.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::collaborators::{
    CollaboratorError, CollaboratorResult, Connector, HubDirectory, HubRpc, LocalIdentity,
    PromiseService, PromiseSpec,
};

/// How a mock hub reacts to a connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HubBehavior {
    /// Accept the connection and issue this token.
    Issue(String),
    /// Refuse the connection.
    Unreachable,
    /// Accept the connection but refuse to issue a token.
    RefuseToken,
}

#[derive(Default)]
struct NetworkState {
    hubs: HashMap<String, HubBehavior>,
    connect_log: Vec<String>,
}

/// In-memory hub network implementing [`Connector`].
///
/// Clones share state, so a test can keep a handle after passing the network
/// to a builder.
#[derive(Clone, Default)]
pub struct MockHubNetwork {
    state: Arc<RwLock<NetworkState>>,
    token_requests: Arc<AtomicUsize>,
}

impl MockHubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hub that issues `token`.
    pub fn add_hub(&self, address: &str, token: &str) {
        self.set_behavior(address, HubBehavior::Issue(token.to_string()));
    }

    /// Register a hub that refuses connections.
    pub fn add_unreachable_hub(&self, address: &str) {
        self.set_behavior(address, HubBehavior::Unreachable);
    }

    /// Register a hub that connects but refuses to issue tokens.
    pub fn add_tokenless_hub(&self, address: &str) {
        self.set_behavior(address, HubBehavior::RefuseToken);
    }

    pub fn set_behavior(&self, address: &str, behavior: HubBehavior) {
        self.write().hubs.insert(address.to_string(), behavior);
    }

    /// Addresses passed to `connect`, in call order.
    pub fn connect_log(&self) -> Vec<String> {
        self.read().connect_log.clone()
    }

    /// Number of `create_token` calls across all hubs.
    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }

    fn read(&self) -> RwLockReadGuard<'_, NetworkState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, NetworkState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Connector for MockHubNetwork {
    async fn connect(&self, address: &str) -> CollaboratorResult<Arc<dyn HubRpc>> {
        let behavior = {
            let mut state = self.write();
            state.connect_log.push(address.to_string());
            state.hubs.get(address).cloned()
        };

        match behavior {
            Some(HubBehavior::Unreachable) => Err(CollaboratorError::ConnectionFailed {
                target: address.to_string(),
                reason: "connection refused".to_string(),
            }),
            None => Err(CollaboratorError::ConnectionFailed {
                target: address.to_string(),
                reason: "unknown hub".to_string(),
            }),
            Some(behavior) => Ok(Arc::new(MockHubRpc {
                behavior,
                token_requests: self.token_requests.clone(),
            })),
        }
    }
}

/// RPC session to a [`MockHubNetwork`] hub.
pub struct MockHubRpc {
    behavior: HubBehavior,
    token_requests: Arc<AtomicUsize>,
}

#[async_trait]
impl HubRpc for MockHubRpc {
    async fn create_token(&self) -> CollaboratorResult<String> {
        self.token_requests.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            HubBehavior::Issue(token) => Ok(token.clone()),
            _ => Err(CollaboratorError::TokenIssuance(
                "token quota exhausted".to_string(),
            )),
        }
    }
}

/// Directory returning a fixed list of hubs.
#[derive(Default)]
pub struct MockHubDirectory {
    hubs: Vec<String>,
    unavailable: bool,
    requests: RwLock<Vec<usize>>,
}

impl MockHubDirectory {
    pub fn new(hubs: Vec<String>) -> Self {
        Self {
            hubs,
            ..Self::default()
        }
    }

    /// A directory whose every lookup fails.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// `count` arguments received, in call order.
    pub fn requests(&self) -> Vec<usize> {
        self.requests
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl HubDirectory for MockHubDirectory {
    async fn get_hubs(&self, count: usize) -> CollaboratorResult<Vec<String>> {
        self.requests
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(count);
        if self.unavailable {
            return Err(CollaboratorError::DirectoryUnavailable(
                "directory offline".to_string(),
            ));
        }
        Ok(self.hubs.iter().take(count).cloned().collect())
    }
}

/// Promise service returning a fixed token.
pub struct MockPromiseService {
    token: String,
    rejection: Option<String>,
    requests: RwLock<Vec<PromiseSpec>>,
}

impl MockPromiseService {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            rejection: None,
            requests: RwLock::new(Vec::new()),
        }
    }

    /// A service that rejects every request with `reason`.
    pub fn rejecting(reason: &str) -> Self {
        Self {
            token: String::new(),
            rejection: Some(reason.to_string()),
            requests: RwLock::new(Vec::new()),
        }
    }

    /// Specs received, in call order.
    pub fn requests(&self) -> Vec<PromiseSpec> {
        self.requests
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl PromiseService for MockPromiseService {
    async fn create(&self, spec: &PromiseSpec) -> CollaboratorResult<String> {
        self.requests
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(spec.clone());
        match &self.rejection {
            Some(reason) => Err(CollaboratorError::PromiseRejected(reason.clone())),
            None => Ok(self.token.clone()),
        }
    }
}

/// Identity with a fixed public key.
#[derive(Clone, Debug)]
pub struct StaticIdentity {
    pubkey: String,
}

impl StaticIdentity {
    pub fn new(pubkey: &str) -> Self {
        Self {
            pubkey: pubkey.to_string(),
        }
    }
}

impl LocalIdentity for StaticIdentity {
    fn pubkey(&self) -> String {
        self.pubkey.clone()
    }
}
