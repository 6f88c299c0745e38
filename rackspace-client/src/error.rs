//! Error types for the Rackspace client

use std::time::Duration;

use rackspace_core::domain::job::JobErrorDetail;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when calling the Rackspace APIs
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error body returned by the API
        message: String,
    },

    /// Identity rejected the credentials or returned an unusable token
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The service catalog has no endpoint for the requested service
    #[error("No endpoint for service {service}{}", region_suffix(.region))]
    EndpointNotFound {
        service: &'static str,
        region: Option<String>,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request, rejected before anything was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A batch status lookup returned nothing for this job
    #[error("No status returned for job {0}")]
    MissingStatus(String),
}

fn region_suffix(region: &Option<String>) -> String {
    region
        .as_deref()
        .map(|r| format!(" in region {}", r))
        .unwrap_or_default()
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Network failures, rate limiting and 5xx responses are worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::ApiError { status, .. } => *status == 413 || *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Why an await over one or more jobs did not succeed
#[derive(Debug, Error)]
pub enum AwaitError {
    /// The service reported the job as failed
    #[error("Job {job_id} failed: {detail}")]
    JobFailed {
        job_id: String,
        detail: JobErrorDetail,
    },

    /// The deadline passed with jobs still in a non-terminal status
    #[error("Timed out after {waited:?} waiting for job(s): {}", .pending.join(", "))]
    Timeout {
        pending: Vec<String>,
        waited: Duration,
    },

    /// Polling itself failed
    #[error("Failed to poll job {job_id}: {source}")]
    Transport {
        job_id: String,
        #[source]
        source: ClientError,
    },
}

impl AwaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_job_failure(&self) -> bool {
        matches!(self, Self::JobFailed { .. })
    }
}

/// Invalid configuration values
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            name,
            reason: reason.into(),
        }
    }
}
