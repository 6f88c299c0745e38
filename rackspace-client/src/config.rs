//! Client configuration
//!
//! Defines the identity region, HTTP settings, and the job await policy.
//! Every interval and timeout is configurable because the observed behavior
//! of the remote services gives no single right value.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

const US_IDENTITY_URL: &str = "https://identity.api.rackspacecloud.com";
const UK_IDENTITY_URL: &str = "https://lon.identity.api.rackspacecloud.com";

/// Longest await a validated policy allows (one week)
const MAX_AWAIT_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Which Rackspace cloud to authenticate against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Us,
    Uk,
}

impl Region {
    /// Identity service base URL for this cloud
    pub fn identity_url(self) -> &'static str {
        match self {
            Region::Us => US_IDENTITY_URL,
            Region::Uk => UK_IDENTITY_URL,
        }
    }
}

impl FromStr for Region {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "uk" | "lon" => Ok(Region::Uk),
            other => Err(ConfigError::invalid(
                "region",
                format!("expected 'us' or 'uk', got '{}'", other),
            )),
        }
    }
}

/// What the awaiter does when a status request itself fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportErrorPolicy {
    /// Surface the failure to the caller immediately
    #[default]
    Propagate,
    /// Log it and poll the job again next round, bounded by the same deadline
    RetryWithinDeadline,
}

/// Polling policy for awaiting asynchronous jobs
#[derive(Debug, Clone, PartialEq)]
pub struct AwaitConfig {
    /// Delay before the second poll
    pub poll_interval: Duration,

    /// Upper bound for the delay once backoff kicks in
    pub max_poll_interval: Duration,

    /// Factor applied to the delay after every poll; 1.0 keeps it fixed
    pub backoff_multiplier: f64,

    /// Total time allowed for all watched jobs to reach a terminal status
    pub timeout: Duration,

    pub transport_errors: TransportErrorPolicy,
}

impl AwaitConfig {
    /// Delay to use after a round that slept for `current`
    pub fn next_interval(&self, current: Duration) -> Duration {
        if self.backoff_multiplier <= 1.0 {
            return current;
        }
        // Saturate at the cap instead of overflowing Duration
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_multiplier)
            .unwrap_or(self.max_poll_interval)
            .min(self.max_poll_interval)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        if self.max_poll_interval < poll_interval {
            self.max_poll_interval = poll_interval;
        }
        self
    }

    /// Creates the await policy from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - RACKSPACE_POLL_INTERVAL (seconds, default: 2)
    /// - RACKSPACE_MAX_POLL_INTERVAL (seconds, default: 10)
    /// - RACKSPACE_BACKOFF_MULTIPLIER (default: 1.0)
    /// - RACKSPACE_AWAIT_TIMEOUT (seconds, default: 600)
    /// - RACKSPACE_RETRY_TRANSPORT_ERRORS (true/false, default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let retry = env_parse::<bool>("RACKSPACE_RETRY_TRANSPORT_ERRORS")?.unwrap_or(false);

        Ok(Self {
            poll_interval: env_secs("RACKSPACE_POLL_INTERVAL")?.unwrap_or(defaults.poll_interval),
            max_poll_interval: env_secs("RACKSPACE_MAX_POLL_INTERVAL")?
                .unwrap_or(defaults.max_poll_interval),
            backoff_multiplier: env_parse::<f64>("RACKSPACE_BACKOFF_MULTIPLIER")?
                .unwrap_or(defaults.backoff_multiplier),
            timeout: env_secs("RACKSPACE_AWAIT_TIMEOUT")?.unwrap_or(defaults.timeout),
            transport_errors: if retry {
                TransportErrorPolicy::RetryWithinDeadline
            } else {
                TransportErrorPolicy::Propagate
            },
        })
    }

    /// Validates the policy
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::invalid("poll_interval", "must be greater than 0"));
        }

        if self.max_poll_interval < self.poll_interval {
            return Err(ConfigError::invalid(
                "max_poll_interval",
                "must not be smaller than poll_interval",
            ));
        }

        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ConfigError::invalid(
                "backoff_multiplier",
                "must be a finite number >= 1.0",
            ));
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::invalid("timeout", "must be greater than 0"));
        }

        if self.timeout > MAX_AWAIT_TIMEOUT {
            return Err(ConfigError::invalid(
                "timeout",
                format!("must not exceed {} seconds", MAX_AWAIT_TIMEOUT.as_secs()),
            ));
        }

        Ok(())
    }
}

impl Default for AwaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_poll_interval: Duration::from_secs(10),
            backoff_multiplier: 1.0,
            timeout: Duration::from_secs(600), // 10 minutes
            transport_errors: TransportErrorPolicy::Propagate,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub region: Region,

    /// Overrides the identity endpoint implied by `region`
    pub identity_url: Option<String>,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,

    pub await_config: AwaitConfig,
}

impl ClientConfig {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            identity_url: None,
            request_timeout: Duration::from_secs(30),
            await_config: AwaitConfig::default(),
        }
    }

    /// Identity base URL actually used, without a trailing slash
    pub fn identity_url(&self) -> &str {
        self.identity_url
            .as_deref()
            .unwrap_or(self.region.identity_url())
            .trim_end_matches('/')
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - RACKSPACE_REGION (us/uk, default: us)
    /// - RACKSPACE_IDENTITY_URL
    /// - RACKSPACE_REQUEST_TIMEOUT (seconds, default: 30)
    /// - plus everything read by [`AwaitConfig::from_env`]
    pub fn from_env() -> Result<Self, ConfigError> {
        let region = match std::env::var("RACKSPACE_REGION") {
            Ok(value) => value.parse()?,
            Err(_) => Region::default(),
        };

        let mut config = Self::new(region);
        config.identity_url = std::env::var("RACKSPACE_IDENTITY_URL").ok();
        if let Some(timeout) = env_secs("RACKSPACE_REQUEST_TIMEOUT")? {
            config.request_timeout = timeout;
        }
        config.await_config = AwaitConfig::from_env()?;

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.identity_url();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::invalid(
                "identity_url",
                "must start with http:// or https://",
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::invalid("request_timeout", "must be greater than 0"));
        }

        self.await_config.validate()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Region::default())
    }
}

fn env_parse<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::invalid(name, e.to_string())),
        Err(_) => Ok(None),
    }
}

fn env_secs(name: &'static str) -> Result<Option<Duration>, ConfigError> {
    Ok(env_parse::<u64>(name)?.map(Duration::from_secs))
}
