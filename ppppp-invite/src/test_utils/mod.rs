//! Test utilities for invite building.
//!
//! In-memory stand-ins for every collaborator the builder consumes, plus
//! shared fixtures. Available to unit tests and, with the `test-utils`
//! feature, to integration tests and downstream crates.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ppppp_invite::test_utils::{MockEnvironment, TestFixtures};
//!
//! let env = MockEnvironment::new(&[TestFixtures::HUB_A]);
//! env.network.add_hub(TestFixtures::HUB_A, "TOKEN_A");
//!
//! let builder = InvitationBuilder::new(env.collaborators(), InviteConfig::default())?;
//! let invitation = builder.create_for_friend(&InviteOptions::new("ALICE")).await?;
//! assert_eq!(env.promise.requests().len(), 1);
//! ```

mod fixtures;
mod mock_network;

pub use fixtures::{MockEnvironment, TestFixtures};
pub use mock_network::{
    HubBehavior, MockHubDirectory, MockHubNetwork, MockHubRpc, MockPromiseService, StaticIdentity,
};
