//! Rackspace examples CLI
//!
//! Example workflows against Rackspace Cloud DNS and Cloud Load Balancers.
//! Each command authenticates, performs a few create/update/list calls,
//! waits for the asynchronous work to finish, prints the result, and
//! revokes its token on the way out.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::{Config, ConnectionOptions};
use rackspace_client::Region;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rackspace-examples")]
#[command(about = "Rackspace Cloud DNS and Cloud Load Balancers examples", long_about = None)]
struct Cli {
    /// Rackspace username
    #[arg(short, long, env = "RACKSPACE_USERNAME")]
    username: String,

    /// Rackspace API key
    #[arg(short = 'k', long, env = "RACKSPACE_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Rackspace cloud to use (us or uk)
    #[arg(long, env = "RACKSPACE_REGION", default_value = "us")]
    region: Region,

    /// Identity endpoint override
    #[arg(long, env = "RACKSPACE_IDENTITY_URL")]
    identity_url: Option<String>,

    /// Seconds between job status polls
    #[arg(long, env = "RACKSPACE_POLL_INTERVAL", default_value_t = 2)]
    poll_interval: u64,

    /// Upper bound in seconds for the poll interval when backing off
    #[arg(long, env = "RACKSPACE_MAX_POLL_INTERVAL")]
    max_poll_interval: Option<u64>,

    /// Factor applied to the poll interval after each poll
    #[arg(long, env = "RACKSPACE_BACKOFF_MULTIPLIER", default_value_t = 1.0)]
    backoff_multiplier: f64,

    /// Seconds to wait for asynchronous jobs before giving up
    #[arg(long, env = "RACKSPACE_AWAIT_TIMEOUT", default_value_t = 600)]
    await_timeout: u64,

    /// Keep polling through network errors instead of failing immediately
    #[arg(long, env = "RACKSPACE_RETRY_TRANSPORT_ERRORS")]
    retry_transport_errors: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            username: self.username.clone(),
            api_key: self.api_key.clone(),
            region: self.region,
            identity_url: self.identity_url.clone(),
            poll_interval_secs: self.poll_interval,
            max_poll_interval_secs: self.max_poll_interval,
            backoff_multiplier: self.backoff_multiplier,
            await_timeout_secs: self.await_timeout,
            retry_transport_errors: self.retry_transport_errors,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rackspace_cli=info,rackspace_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_options(cli.connection_options())?;

    handle_command(cli.command, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_update_domains() {
        let cli = Cli::try_parse_from([
            "rackspace-examples",
            "-u",
            "demo",
            "-k",
            "key",
            "--region",
            "uk",
            "dns",
            "update-domains",
        ])
        .unwrap();

        assert_eq!(cli.region, Region::Uk);
        assert_eq!(cli.poll_interval, 2);
        assert!(matches!(cli.command, Commands::Dns { .. }));
    }

    #[test]
    fn test_rejects_unknown_region() {
        let result = Cli::try_parse_from([
            "rackspace-examples",
            "-u",
            "demo",
            "-k",
            "key",
            "--region",
            "mars",
            "dns",
            "list",
        ]);
        assert!(result.is_err());
    }
}
