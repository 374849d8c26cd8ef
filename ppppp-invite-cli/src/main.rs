//! ppppp invite CLI
//!
//! Command-line interface for inspecting, validating and creating ppppp invite URIs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ppppp_invite::ProtocolRevision;
use std::path::PathBuf;

use ppppp_invite_cli::commands::create::{CreateArgs, InviteKind};
use ppppp_invite_cli::{commands, config, ui};

#[derive(Parser)]
#[command(name = "ppppp-invite")]
#[command(about = "Inspect, validate and create ppppp invite URIs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON config file (can also be set via PPPPP_INVITE_CONFIG env var)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Protocol revision (v1, v2, v3), overriding the config file
    #[arg(long, global = true)]
    revision: Option<ProtocolRevision>,

    /// Skip unrecognized commands instead of rejecting the invite
    #[arg(long, global = true)]
    skip_unknown: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an invite URI or display URL and list its commands
    Parse {
        /// Invite URI (ppppp://invite/...) or display URL (https://host/invite#...)
        input: String,

        /// Print the decoded commands as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the shareable display URL for an invite URI
    Url {
        /// Invite URI
        uri: String,

        /// Also render the URL as a QR code
        #[arg(long)]
        qr: bool,
    },

    /// Validate an invite URI and confirm it is in canonical form
    Check {
        /// Invite URI
        uri: String,
    },

    /// Create an invitation from hub tokens obtained out of band
    Create {
        /// Invitation kind
        #[arg(value_enum)]
        kind: InviteKind,

        /// Account or identity the promise is minted for
        #[arg(long)]
        id: String,

        /// Hub address (multiaddr or multiserver); repeat for several hubs
        #[arg(long = "hub", required = true)]
        hubs: Vec<String>,

        /// Join token issued by the matching --hub; repeat in the same order
        #[arg(long = "token", required = true)]
        tokens: Vec<String>,

        /// Promise token to embed
        #[arg(long)]
        promise: String,

        /// Public key of this device (required for myself invites)
        #[arg(long)]
        pubkey: Option<String>,

        /// Print the invitation as JSON
        #[arg(long)]
        json: bool,

        /// Also render the URL as a QR code
        #[arg(long)]
        qr: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("ppppp_invite=debug,ppppp_invite_cli=debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("ppppp_invite_cli=info,ppppp_invite=warn")
            .with_writer(std::io::stderr)
            .init();
    }

    let config = config::load(cli.config.as_deref())?;
    let config = config::apply_overrides(config, cli.revision, cli.skip_unknown);

    let result = match cli.command {
        Commands::Parse { input, json } => commands::parse::run(&config, &input, json, cli.verbose),
        Commands::Url { uri, qr } => commands::url::run(&config, &uri, qr),
        Commands::Check { uri } => commands::check::run(&config, &uri),
        Commands::Create {
            kind,
            id,
            hubs,
            tokens,
            promise,
            pubkey,
            json,
            qr,
        } => {
            let args = CreateArgs {
                kind,
                id,
                hubs,
                tokens,
                promise,
                pubkey,
            };
            commands::create::run(&config, &args, json, qr).await
        }
    };

    if let Err(e) = result {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
