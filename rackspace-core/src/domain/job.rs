//! Asynchronous job domain types
//!
//! Cloud DNS answers most mutating calls with `202 Accepted` and a job
//! handle. The job has its own lifecycle on the server, independent of the
//! HTTP request that created it.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-tracked handle for an in-progress asynchronous mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(default)]
    pub verb: Option<String>,
    #[serde(default)]
    pub request_url: Option<String>,
    #[serde(default)]
    pub callback_url: Option<String>,
    /// Resource state returned once the job completes (only with `showDetails=true`)
    #[serde(default)]
    pub response: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JobErrorDetail>,
}

impl Job {
    /// Error detail for a failed job, falling back to a generic message when
    /// the service did not include one
    pub fn error_detail(&self) -> JobErrorDetail {
        self.error.clone().unwrap_or_else(|| JobErrorDetail {
            code: None,
            message: Some(format!("job {} reported {}", self.job_id, self.status)),
            details: None,
        })
    }
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Initialized,
    Queued,
    Running,
    Completed,
    Error,
    #[serde(other)]
    Unrecognized,
}

impl JobStatus {
    /// Whether no further transition can occur from this status
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initialized => "INITIALIZED",
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Error => "ERROR",
            Self::Unrecognized => "UNRECOGNIZED",
        };
        f.write_str(s)
    }
}

/// Failure detail attached to a job in `ERROR` status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobErrorDetail {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

impl fmt::Display for JobErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "[{}] ", code)?;
        }
        f.write_str(self.message.as_deref().unwrap_or("unknown error"))?;
        if let Some(details) = &self.details {
            write!(f, ": {}", details)?;
        }
        Ok(())
    }
}
