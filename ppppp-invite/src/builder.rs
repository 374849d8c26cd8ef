//! Invitation builder.
//!
//! Produces invite URIs by negotiating join tokens with one or more hubs and
//! minting a promise that the recipient redeems after joining.
//!
//! Two kinds of invitation exist:
//!
//! - **friend**: join the hub(s), follow the inviter, redeem a follow promise.
//! - **myself**: join the hub(s), open a tunnel back to this device through the
//!   first hub, redeem an account-add promise.
//!
//! Per-hub failures are tolerated as long as at least one hub yields a join.
//! Everything else is fatal.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::address::{AddressError, HubAddress};
use crate::collaborators::{
    CollaboratorError, Collaborators, Connector, HubDirectory, LocalIdentity, PromiseService,
    PromiseSpec,
};
use crate::command::{Command, JoinAddress, PromiseCommand, TunnelAddress};
use crate::config::InviteConfig;
use crate::errors::{HubFailure, HubFailures, HubStage};
use crate::revision::RESERVED;
use crate::uri::Codec;
use crate::{InviteError, Result};

/// Caller options for a single invitation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteOptions {
    /// Hubs to request from the directory. Falls back to the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hubs: Option<usize>,

    /// Account (for myself) or identity (for a friend) the promise is minted for.
    pub id: String,

    /// Use this hub instead of asking the directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_address: Option<String>,
}

impl InviteOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            hubs: None,
            id: id.into(),
            hub_address: None,
        }
    }

    pub fn with_hubs(mut self, hubs: usize) -> Self {
        self.hubs = Some(hubs);
        self
    }

    pub fn with_hub_address(mut self, address: impl Into<String>) -> Self {
        self.hub_address = Some(address.into());
        self
    }

    /// Build options from an untyped JSON object.
    ///
    /// # Errors
    ///
    /// [`InviteError::Validation`] when `id` is missing or not a non-empty
    /// string, or when `hubs` is present but not a positive integer.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| InviteError::Validation("options must be an object".to_string()))?;

        let id = match object.get("id") {
            Some(serde_json::Value::String(id)) => id.clone(),
            Some(_) => return Err(InviteError::Validation("id must be a string".to_string())),
            None => return Err(InviteError::Validation("id is required".to_string())),
        };

        let hubs = match object.get("hubs") {
            None | Some(serde_json::Value::Null) => None,
            Some(hubs) => {
                let hubs = hubs.as_u64().ok_or_else(|| {
                    InviteError::Validation("hubs must be a non-negative integer".to_string())
                })?;
                let hubs = usize::try_from(hubs)
                    .map_err(|_| InviteError::Validation("hubs is too large".to_string()))?;
                Some(hubs)
            }
        };

        let hub_address = match object.get("hub_address").or_else(|| object.get("hubAddress")) {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(address)) => Some(address.clone()),
            Some(_) => {
                return Err(InviteError::Validation(
                    "hub_address must be a string".to_string(),
                ))
            }
        };

        let options = Self {
            hubs,
            id,
            hub_address,
        };
        options.validate()?;
        Ok(options)
    }

    /// Check the options without touching any collaborator.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(InviteError::Validation("id is required".to_string()));
        }
        if let Some(reserved) = self.id.chars().find(|c| RESERVED.contains(c)) {
            return Err(InviteError::Validation(format!(
                "id must not contain '{}'",
                reserved
            )));
        }
        if self.hubs == Some(0) {
            return Err(InviteError::Validation(
                "hubs must be at least 1".to_string(),
            ));
        }
        if matches!(&self.hub_address, Some(address) if address.trim().is_empty()) {
            return Err(InviteError::Validation(
                "hub_address must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A finished invitation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    /// The `ppppp://invite/...` URI.
    pub uri: String,
    /// Human-shareable URL carrying the URI in its fragment.
    pub url: String,
}

/// Sequences hub negotiation, promise minting and URI assembly.
pub struct InvitationBuilder {
    connector: Arc<dyn Connector>,
    hub_directory: Option<Arc<dyn HubDirectory>>,
    promise: Arc<dyn PromiseService>,
    identity: Arc<dyn LocalIdentity>,
    codec: Codec,
    config: InviteConfig,
}

impl InvitationBuilder {
    /// Create a builder, checking required capabilities up front.
    ///
    /// # Errors
    ///
    /// [`InviteError::MissingCapability`] when the connector, promise service or
    /// local identity is absent, [`InviteError::Config`] for an invalid config.
    pub fn new(collaborators: Collaborators, config: InviteConfig) -> Result<Self> {
        config.validate()?;
        let connector = collaborators
            .connector
            .ok_or(InviteError::MissingCapability("connector"))?;
        let promise = collaborators
            .promise
            .ok_or(InviteError::MissingCapability("promise service"))?;
        let identity = collaborators
            .identity
            .ok_or(InviteError::MissingCapability("local identity"))?;

        Ok(Self {
            connector,
            hub_directory: collaborators.hub_directory,
            promise,
            identity,
            codec: Codec::from_config(&config),
            config,
        })
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn config(&self) -> &InviteConfig {
        &self.config
    }

    /// Invite another person to follow `options.id`.
    #[tracing::instrument(skip(self, options), fields(id = %options.id, revision = %self.codec.revision()))]
    pub async fn create_for_friend(&self, options: &InviteOptions) -> Result<Invitation> {
        options.validate()?;
        let joins = self.negotiate_joins(options).await?;
        let token = self.mint_promise(PromiseSpec::follow(&options.id)).await?;

        let issuer_kind = self.codec.strategy().issuer_kind();
        let mut commands: Vec<Command> = joins.into_iter().map(Command::Join).collect();
        commands.push(Command::Follow {
            id: options.id.clone(),
        });
        commands.push(Command::PromiseFollow(PromiseCommand::new(
            issuer_kind,
            &options.id,
            token,
        )));
        self.assemble(&commands)
    }

    /// Invite another device of this account to connect back to this one.
    #[tracing::instrument(skip(self, options), fields(id = %options.id, revision = %self.codec.revision()))]
    pub async fn create_for_myself(&self, options: &InviteOptions) -> Result<Invitation> {
        options.validate()?;
        let joins = self.negotiate_joins(options).await?;
        let hub_pubkey = joins
            .first()
            .map(|join| join.pubkey.clone())
            .ok_or(InviteError::NoHubsAvailable)?;
        let token = self
            .mint_promise(PromiseSpec::account_add(&options.id))
            .await?;

        let issuer_kind = self.codec.strategy().issuer_kind();
        let mut commands: Vec<Command> = joins.into_iter().map(Command::Join).collect();
        commands.push(Command::TunnelConnect(TunnelAddress::new(
            hub_pubkey,
            self.identity.pubkey(),
        )));
        commands.push(Command::PromiseAccountAdd(PromiseCommand::new(
            issuer_kind,
            &options.id,
            token,
        )));
        self.assemble(&commands)
    }

    /// Resolve candidate hubs and negotiate a join with each, in candidate order.
    async fn negotiate_joins(&self, options: &InviteOptions) -> Result<Vec<JoinAddress>> {
        let candidates = self.resolve_hubs(options).await?;

        let outcomes = if self.config.concurrent_negotiation {
            join_all(candidates.iter().map(|address| self.negotiate_hub(address))).await
        } else {
            let mut outcomes = Vec::with_capacity(candidates.len());
            for address in &candidates {
                outcomes.push(self.negotiate_hub(address).await);
            }
            outcomes
        };

        let mut joins = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(join) => joins.push(join),
                Err(failure) => {
                    tracing::warn!(
                        hub = %failure.address,
                        stage = %failure.stage,
                        error = %failure.cause,
                        "skipping hub"
                    );
                    failures.push(failure);
                }
            }
        }

        if joins.is_empty() {
            return Err(InviteError::AllHubsFailed(HubFailures::new(failures)));
        }
        Ok(joins)
    }

    async fn resolve_hubs(&self, options: &InviteOptions) -> Result<Vec<String>> {
        if let Some(address) = &options.hub_address {
            return Ok(vec![address.clone()]);
        }

        let directory = self
            .hub_directory
            .as_ref()
            .ok_or(InviteError::MissingCapability("hub directory"))?;

        let requested = options.hubs.unwrap_or(self.config.default_hubs);
        let count = match self.codec.strategy().max_hubs() {
            Some(max) => requested.min(max),
            None => requested,
        };

        let mut hubs = directory
            .get_hubs(count)
            .await
            .map_err(InviteError::HubDirectory)?;
        if hubs.is_empty() {
            return Err(InviteError::NoHubsAvailable);
        }
        hubs.truncate(count);
        tracing::debug!(count = hubs.len(), "resolved candidate hubs");
        Ok(hubs)
    }

    async fn negotiate_hub(&self, address: &str) -> std::result::Result<JoinAddress, HubFailure> {
        tracing::debug!(hub = address, "negotiating join token");

        let rpc = self
            .connector
            .connect(address)
            .await
            .map_err(|e| HubFailure::new(address, HubStage::Connect, e))?;

        let token = rpc
            .create_token()
            .await
            .map_err(|e| HubFailure::new(address, HubStage::CreateToken, e))?;
        if token.is_empty() {
            return Err(HubFailure::new(
                address,
                HubStage::CreateToken,
                CollaboratorError::TokenIssuance("hub returned an empty token".to_string()),
            ));
        }

        let hub: HubAddress = address
            .parse()
            .map_err(|e: AddressError| HubFailure::new(address, HubStage::Address, e))?;
        let join = hub.into_join(token);
        self.codec.encode_join(&join).map_err(|e| {
            HubFailure::new(
                address,
                HubStage::Address,
                AddressError::Unencodable {
                    address: address.to_string(),
                    reason: e.to_string(),
                },
            )
        })?;
        Ok(join)
    }

    async fn mint_promise(&self, spec: PromiseSpec) -> Result<String> {
        let token = self
            .promise
            .create(&spec)
            .await
            .map_err(InviteError::PromiseMinting)?;
        if token.is_empty() {
            return Err(InviteError::PromiseMinting(
                CollaboratorError::PromiseRejected("empty promise token".to_string()),
            ));
        }
        if token.contains(RESERVED) {
            return Err(InviteError::PromiseMinting(
                CollaboratorError::PromiseRejected(format!(
                    "promise token \"{}\" is not a single path segment",
                    token
                )),
            ));
        }
        Ok(token)
    }

    fn assemble(&self, commands: &[Command]) -> Result<Invitation> {
        let uri = self.codec.encode_uri(commands)?;
        let url = self
            .codec
            .display_url_for(commands, &uri)
            .ok_or(InviteError::NoHubsAvailable)?;
        tracing::debug!(%uri, "invitation assembled");
        Ok(Invitation { uri, url })
    }
}

impl std::fmt::Debug for InvitationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvitationBuilder")
            .field("codec", &self.codec)
            .field("config", &self.config)
            .field("has_hub_directory", &self.hub_directory.is_some())
            .finish()
    }
}
