//! Create command - assemble an invitation from tokens obtained out of band
//!
//! The CLI has no network stack of its own. Hub tokens and the promise token
//! are supplied on the command line and served to the invitation builder by
//! preset collaborators, so the same negotiation and assembly rules apply as
//! in an application.

use anyhow::{bail, Result};
use async_trait::async_trait;
use ppppp_invite::{
    CollaboratorError, CollaboratorResult, Collaborators, Connector, HubDirectory, HubRpc,
    Invitation, InvitationBuilder, InviteConfig, InviteOptions, LocalIdentity, PromiseService,
    PromiseSpec,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::ui;

/// Which invitation to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum InviteKind {
    /// Invite someone else to follow `--id`
    Friend,
    /// Invite another device of account `--id`
    Myself,
}

/// Inputs for `create`.
#[derive(Clone, Debug)]
pub struct CreateArgs {
    pub kind: InviteKind,
    pub id: String,
    /// Hub addresses paired by position with `tokens`.
    pub hubs: Vec<String>,
    pub tokens: Vec<String>,
    pub promise: String,
    pub pubkey: Option<String>,
}

/// Hubs whose tokens are already known.
struct PresetHubs {
    tokens: HashMap<String, String>,
    order: Vec<String>,
}

struct PresetToken(String);

#[async_trait]
impl HubRpc for PresetToken {
    async fn create_token(&self) -> CollaboratorResult<String> {
        Ok(self.0.clone())
    }
}

#[async_trait]
impl Connector for PresetHubs {
    async fn connect(&self, address: &str) -> CollaboratorResult<Arc<dyn HubRpc>> {
        match self.tokens.get(address) {
            Some(token) => Ok(Arc::new(PresetToken(token.clone()))),
            None => Err(CollaboratorError::ConnectionFailed {
                target: address.to_string(),
                reason: "no token was given for this hub".to_string(),
            }),
        }
    }
}

#[async_trait]
impl HubDirectory for PresetHubs {
    async fn get_hubs(&self, count: usize) -> CollaboratorResult<Vec<String>> {
        Ok(self.order.iter().take(count).cloned().collect())
    }
}

struct PresetPromise(String);

#[async_trait]
impl PromiseService for PresetPromise {
    async fn create(&self, _spec: &PromiseSpec) -> CollaboratorResult<String> {
        Ok(self.0.clone())
    }
}

struct PresetIdentity(String);

impl LocalIdentity for PresetIdentity {
    fn pubkey(&self) -> String {
        self.0.clone()
    }
}

/// Build the invitation without printing it.
pub async fn build(config: &InviteConfig, args: &CreateArgs) -> Result<Invitation> {
    if args.hubs.is_empty() {
        bail!("At least one --hub is required");
    }
    if args.hubs.len() != args.tokens.len() {
        bail!(
            "Got {} --hub value(s) but {} --token value(s); pass one token per hub",
            args.hubs.len(),
            args.tokens.len()
        );
    }
    let mut seen = HashSet::new();
    if let Some(duplicate) = args.hubs.iter().find(|hub| !seen.insert(hub.as_str())) {
        bail!("--hub {} was given more than once", duplicate);
    }
    let pubkey = match (args.kind, &args.pubkey) {
        (InviteKind::Myself, None) => bail!("--pubkey is required for a myself invite"),
        (_, pubkey) => pubkey.clone().unwrap_or_default(),
    };

    let hubs = Arc::new(PresetHubs {
        tokens: args
            .hubs
            .iter()
            .cloned()
            .zip(args.tokens.iter().cloned())
            .collect(),
        order: args.hubs.clone(),
    });
    let collaborators = Collaborators::new()
        .with_connector(hubs.clone())
        .with_hub_directory(hubs)
        .with_promise_service(Arc::new(PresetPromise(args.promise.clone())))
        .with_identity(Arc::new(PresetIdentity(pubkey)));

    let builder = InvitationBuilder::new(collaborators, config.clone())?;
    let options = InviteOptions::new(&args.id).with_hubs(args.hubs.len());

    let invitation = match args.kind {
        InviteKind::Friend => builder.create_for_friend(&options).await?,
        InviteKind::Myself => builder.create_for_myself(&options).await?,
    };
    Ok(invitation)
}

#[tracing::instrument(skip(config, args), fields(kind = ?args.kind, hubs = args.hubs.len()))]
pub async fn run(config: &InviteConfig, args: &CreateArgs, json: bool, qr: bool) -> Result<()> {
    let invitation = build(config, args).await?;

    if json {
        ui::json(&invitation)?;
        return Ok(());
    }

    ui::header("Invitation");
    ui::key_value("URI", &invitation.uri);
    ui::key_value("URL", &invitation.url);
    if qr {
        ui::qr_code(&invitation.url)?;
    }
    ui::success(&format!("Created {} invite for {}", config.revision, args.id));
    Ok(())
}
