//! Rackspace Client
//!
//! A small, type-safe async client for the slice of the Rackspace Cloud DNS
//! and Cloud Load Balancers APIs used by the example workflows, plus the
//! [`JobAwaiter`] that turns "submit a change, get a job" into "wait until the
//! change has actually happened".
//!
//! # Example
//!
//! ```no_run
//! use rackspace_client::{ClientConfig, Credentials, JobAwaiter, RackspaceClient};
//! use rackspace_core::dto::dns::UpdateDomain;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = RackspaceClient::new(
//!         Credentials::new("username", "api-key"),
//!         ClientConfig::default(),
//!     )?;
//!
//!     let domain = client.find_domain_by_name("example.com").await?;
//!     let job = client
//!         .update_domain(domain.id, &UpdateDomain::builder().ttl(3600).build())
//!         .await?;
//!
//!     JobAwaiter::new(&client, client.config().await_config.clone())
//!         .await_one(job.job_id)
//!         .await?;
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
mod dns;
pub mod error;
mod identity;
mod jobs;
mod loadbalancers;
pub mod waiter;

// Re-export commonly used types
pub use config::{AwaitConfig, ClientConfig, Region, TransportErrorPolicy};
pub use error::{AwaitError, ClientError, ConfigError, Result};
pub use identity::Credentials;
pub use loadbalancers::LoadBalancerProvisioning;
pub use waiter::{JobAwaiter, JobState, JobStatusProvider};

use identity::{AUTH_TOKEN_HEADER, Service, Session};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::debug;

/// HTTP client for the Rackspace Cloud DNS and Cloud Load Balancers APIs
///
/// Authentication is lazy: the first API call obtains a token, and the token
/// is renewed shortly before it expires. Call [`RackspaceClient::close`] when
/// done to revoke it.
#[derive(Debug)]
pub struct RackspaceClient {
    credentials: Credentials,
    config: ClientConfig,
    /// HTTP client instance
    http: Client,
    session: RwLock<Option<Session>>,
}

impl RackspaceClient {
    /// Create a new client
    ///
    /// No network traffic happens until the first API call.
    ///
    /// # Arguments
    /// * `credentials` - Rackspace username and API key
    /// * `config` - Region, timeouts and await policy
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("rackspace-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Self::with_client(credentials, config, http)
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure proxies, TLS settings, etc.
    pub fn with_client(credentials: Credentials, config: ClientConfig, http: Client) -> Result<Self> {
        if credentials.username.trim().is_empty() {
            return Err(ClientError::InvalidRequest("username cannot be empty".to_string()));
        }
        if credentials.api_key.trim().is_empty() {
            return Err(ClientError::InvalidRequest("API key cannot be empty".to_string()));
        }
        config
            .validate()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            credentials,
            config,
            http,
            session: RwLock::new(None),
        })
    }

    /// Create a client and authenticate immediately
    pub async fn connect(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        let client = Self::new(credentials, config)?;
        client.session().await?;
        Ok(client)
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // =============================================================================
    // Request Construction
    // =============================================================================

    /// Build an authenticated request against a service endpoint
    ///
    /// `path` is appended to the endpoint's public URL, which already contains
    /// the tenant id.
    async fn request(
        &self,
        method: Method,
        service: Service,
        region: Option<&str>,
        path: &str,
    ) -> Result<RequestBuilder> {
        let session = self.session().await?;
        let url = format!("{}{}", session.endpoint(service, region)?, path);
        debug!("{} {}", method, url);

        Ok(self
            .http
            .request(method, url)
            .header(AUTH_TOKEN_HEADER, session.token)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content (e.g., DELETE operations)
    ///
    /// This method checks the status code and returns an error if the request failed.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
