//! Cloud DNS job status endpoint

use async_trait::async_trait;
use rackspace_core::domain::job::{Job, JobStatus};
use reqwest::Method;
use tracing::warn;
use uuid::Uuid;

use crate::RackspaceClient;
use crate::error::Result;
use crate::identity::Service;
use crate::waiter::{JobState, JobStatusProvider};

impl RackspaceClient {
    /// Get the current status of an asynchronous Cloud DNS job
    ///
    /// Details are requested so a completed job carries the resulting
    /// resource and a failed one carries its error.
    pub async fn get_job(&self, job_id: Uuid) -> Result<Job> {
        let path = format!("/status/{}?showDetails=true", job_id);
        let response = self
            .request(Method::GET, Service::Dns, None, &path)
            .await?
            .send()
            .await?;

        self.handle_response(response).await
    }
}

#[async_trait]
impl JobStatusProvider for RackspaceClient {
    type Id = Uuid;
    type Snapshot = Job;

    async fn fetch_status(&self, id: &Uuid) -> Result<Job> {
        self.get_job(*id).await
    }

    fn classify(&self, job: &Job) -> JobState {
        classify_job(job)
    }
}

pub(crate) fn classify_job(job: &Job) -> JobState {
    match job.status {
        JobStatus::Completed => JobState::Succeeded,
        JobStatus::Error => JobState::Failed(job.error_detail()),
        JobStatus::Unrecognized => {
            warn!("Job {} has an unrecognized status, still waiting", job.job_id);
            JobState::Pending
        }
        JobStatus::Initialized | JobStatus::Queued | JobStatus::Running => JobState::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: &str) -> Job {
        let error = if status == "ERROR" {
            serde_json::json!({"code": 404, "message": "Not found", "details": "Domain ID 1 not found"})
        } else {
            serde_json::Value::Null
        };

        serde_json::from_value(serde_json::json!({
            "jobId": "852a1e4a-b9c5-47a7-9ec4-7bb7d9a3c3a4",
            "status": status,
            "error": error
        }))
        .unwrap()
    }

    #[test]
    fn test_classify_dns_jobs() {
        assert_eq!(classify_job(&job("INITIALIZED")), JobState::Pending);
        assert_eq!(classify_job(&job("RUNNING")), JobState::Pending);
        assert_eq!(classify_job(&job("SOMETHING_NEW")), JobState::Pending);
        assert_eq!(classify_job(&job("COMPLETED")), JobState::Succeeded);

        match classify_job(&job("ERROR")) {
            JobState::Failed(detail) => {
                assert_eq!(detail.code, Some(404));
                assert_eq!(detail.details.as_deref(), Some("Domain ID 1 not found"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
