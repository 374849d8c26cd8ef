//! Test fixtures.

use std::sync::Arc;

use super::mock_network::{MockHubDirectory, MockHubNetwork, MockPromiseService, StaticIdentity};
use crate::collaborators::Collaborators;

/// Collection of commonly used test fixtures.
pub struct TestFixtures;

impl TestFixtures {
    /// Hub in multiserver notation.
    pub const HUB_MULTISERVER: &'static str = "net:example.com:8008~shse:HUB_PUBKEY";
    pub const HUB_PUBKEY: &'static str = "HUB_PUBKEY";

    /// Hub in multiaddr notation.
    pub const HUB_MULTIADDR: &'static str = "/dns/example.com/tcp/8080/shse/PUBKEY";
    pub const HUB_MULTIADDR_PUBKEY: &'static str = "PUBKEY";

    /// Three distinct hubs for aggregation tests.
    pub const HUB_A: &'static str = "net:hub-a.example.com:8008~shse:HUB_A_PUBKEY";
    pub const HUB_B: &'static str = "net:hub-b.example.com:8008~shse:HUB_B_PUBKEY";
    pub const HUB_C: &'static str = "/ip4/10.0.0.3/tcp/8008/shse/HUB_C_PUBKEY";

    pub const TOKEN: &'static str = "MOCK_TOKEN";
    pub const PROMISE: &'static str = "MOCK_PROMISE";
    pub const SELF_PUBKEY: &'static str = "SELF_PUBKEY";
    pub const ACCOUNT_ID: &'static str = "ACCOUNT_ID";
    pub const FRIEND_ID: &'static str = "MOCK_ID";
}

/// Mock collaborators with handles kept for inspection.
pub struct MockEnvironment {
    pub network: MockHubNetwork,
    pub directory: Arc<MockHubDirectory>,
    pub promise: Arc<MockPromiseService>,
    pub identity: Arc<StaticIdentity>,
}

impl MockEnvironment {
    /// Directory listing `hubs`, promise service issuing [`TestFixtures::PROMISE`],
    /// identity [`TestFixtures::SELF_PUBKEY`]. No hub is registered yet.
    pub fn new(hubs: &[&str]) -> Self {
        Self {
            network: MockHubNetwork::new(),
            directory: Arc::new(MockHubDirectory::new(
                hubs.iter().map(|hub| hub.to_string()).collect(),
            )),
            promise: Arc::new(MockPromiseService::new(TestFixtures::PROMISE)),
            identity: Arc::new(StaticIdentity::new(TestFixtures::SELF_PUBKEY)),
        }
    }

    pub fn with_directory(mut self, directory: MockHubDirectory) -> Self {
        self.directory = Arc::new(directory);
        self
    }

    pub fn with_promise_service(mut self, promise: MockPromiseService) -> Self {
        self.promise = Arc::new(promise);
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new()
            .with_connector(Arc::new(self.network.clone()))
            .with_hub_directory(self.directory.clone())
            .with_promise_service(self.promise.clone())
            .with_identity(self.identity.clone())
    }
}
