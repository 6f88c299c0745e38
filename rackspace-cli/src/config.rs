//! Configuration module
//!
//! Turns parsed command-line options into the credentials and client
//! configuration shared by every workflow.

use std::time::Duration;

use anyhow::{Context, Result};
use rackspace_client::{AwaitConfig, ClientConfig, Credentials, Region, TransportErrorPolicy};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub client: ClientConfig,
}

/// Raw connection and polling options, as given on the command line
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub username: String,
    pub api_key: String,
    pub region: Region,
    pub identity_url: Option<String>,
    pub poll_interval_secs: u64,
    pub max_poll_interval_secs: Option<u64>,
    pub backoff_multiplier: f64,
    pub await_timeout_secs: u64,
    pub retry_transport_errors: bool,
}

impl Config {
    /// Builds and validates the configuration
    pub fn from_options(options: ConnectionOptions) -> Result<Self> {
        let poll_interval = Duration::from_secs(options.poll_interval_secs);
        let max_poll_interval = options
            .max_poll_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(poll_interval)
            .max(poll_interval);

        let mut client = ClientConfig::new(options.region);
        client.identity_url = options.identity_url;
        client.await_config = AwaitConfig {
            poll_interval,
            max_poll_interval,
            backoff_multiplier: options.backoff_multiplier,
            timeout: Duration::from_secs(options.await_timeout_secs),
            transport_errors: if options.retry_transport_errors {
                TransportErrorPolicy::RetryWithinDeadline
            } else {
                TransportErrorPolicy::Propagate
            },
        };

        client.validate().context("Invalid configuration")?;

        Ok(Self {
            credentials: Credentials::new(options.username, options.api_key),
            client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ConnectionOptions {
        ConnectionOptions {
            username: "demo".to_string(),
            api_key: "key".to_string(),
            region: Region::Us,
            identity_url: None,
            poll_interval_secs: 2,
            max_poll_interval_secs: None,
            backoff_multiplier: 1.0,
            await_timeout_secs: 600,
            retry_transport_errors: false,
        }
    }

    #[test]
    fn test_defaults_map_to_fixed_interval() {
        let config = Config::from_options(options()).unwrap();
        let await_config = &config.client.await_config;

        assert_eq!(await_config.poll_interval, Duration::from_secs(2));
        assert_eq!(await_config.max_poll_interval, Duration::from_secs(2));
        assert_eq!(await_config.transport_errors, TransportErrorPolicy::Propagate);
        assert_eq!(config.credentials.username, "demo");
    }

    #[test]
    fn test_retry_flag_and_backoff() {
        let config = Config::from_options(ConnectionOptions {
            max_poll_interval_secs: Some(10),
            backoff_multiplier: 1.5,
            retry_transport_errors: true,
            ..options()
        })
        .unwrap();

        let await_config = &config.client.await_config;
        assert_eq!(await_config.max_poll_interval, Duration::from_secs(10));
        assert_eq!(
            await_config.transport_errors,
            TransportErrorPolicy::RetryWithinDeadline
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_poll = ConnectionOptions {
            poll_interval_secs: 0,
            ..options()
        };
        assert!(Config::from_options(zero_poll).is_err());

        let shrinking = ConnectionOptions {
            backoff_multiplier: 0.5,
            ..options()
        };
        assert!(Config::from_options(shrinking).is_err());

        let endless = ConnectionOptions {
            await_timeout_secs: u64::MAX,
            ..options()
        };
        assert!(Config::from_options(endless).is_err());
    }
}
