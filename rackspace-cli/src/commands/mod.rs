//! Commands module
//!
//! Defines the example workflows and the scoped client they run with.

mod clb;
mod dns;

pub use clb::ClbCommands;
pub use dns::DnsCommands;

use anyhow::{Context, Result};
use clap::Subcommand;
use rackspace_client::RackspaceClient;
use tracing::warn;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Cloud DNS examples
    Dns {
        #[command(subcommand)]
        command: DnsCommands,
    },
    /// Cloud Load Balancers examples
    Clb {
        /// Region holding the load balancers (DFW, ORD, IAD, LON, SYD, HKG)
        #[arg(long, env = "RACKSPACE_CLB_ZONE", default_value = "DFW")]
        zone: String,

        #[command(subcommand)]
        command: ClbCommands,
    },
}

/// Handle a CLI command
///
/// Builds the client, routes the command to its handler, and closes the
/// client afterwards whether the command succeeded or not.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = RackspaceClient::new(config.credentials.clone(), config.client.clone())
        .context("Failed to create Rackspace client")?;

    let result = match command {
        Commands::Dns { command } => dns::handle_dns_command(command, &client).await,
        Commands::Clb { zone, command } => clb::handle_clb_command(command, &zone, &client).await,
    };

    close_quietly(&client).await;
    result
}

/// Always close the client when done; a failed close is only logged
async fn close_quietly(client: &RackspaceClient) {
    if let Err(e) = client.close().await {
        warn!("Failed to close Rackspace client: {:#}", e);
    }
}
