//! Cloud Load Balancers endpoints
//!
//! Load balancers are regional, so every call takes the zone (e.g. `DFW`)
//! whose catalog endpoint should be used.

use async_trait::async_trait;
use rackspace_core::domain::job::JobErrorDetail;
use rackspace_core::domain::loadbalancer::{LoadBalancer, LoadBalancerStatus};
use rackspace_core::dto::loadbalancer::CreateLoadBalancer;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::RackspaceClient;
use crate::config::AwaitConfig;
use crate::error::{AwaitError, ClientError, Result};
use crate::identity::Service;
use crate::waiter::{JobAwaiter, JobState, JobStatusProvider};

impl RackspaceClient {
    /// Create a load balancer
    ///
    /// The request is validated locally first. The returned load balancer is
    /// usually still in `BUILD`; see [`RackspaceClient::await_load_balancer_active`].
    pub async fn create_load_balancer(
        &self,
        zone: &str,
        req: &CreateLoadBalancer,
    ) -> Result<LoadBalancer> {
        req.validate().map_err(ClientError::InvalidRequest)?;

        let response = self
            .request(Method::POST, Service::LoadBalancers, Some(zone), "/loadbalancers")
            .await?
            .json(&LoadBalancerEnvelope { load_balancer: req })
            .send()
            .await?;

        let body: LoadBalancerEnvelope<LoadBalancer> = self.handle_response(response).await?;
        Ok(body.load_balancer)
    }

    /// Get a load balancer by ID
    pub async fn get_load_balancer(&self, zone: &str, id: u64) -> Result<LoadBalancer> {
        let path = format!("/loadbalancers/{}", id);
        let response = self
            .request(Method::GET, Service::LoadBalancers, Some(zone), &path)
            .await?
            .send()
            .await?;

        let body: LoadBalancerEnvelope<LoadBalancer> = self.handle_response(response).await?;
        Ok(body.load_balancer)
    }

    /// List the load balancers in a zone
    pub async fn list_load_balancers(&self, zone: &str) -> Result<Vec<LoadBalancer>> {
        let response = self
            .request(Method::GET, Service::LoadBalancers, Some(zone), "/loadbalancers")
            .await?
            .send()
            .await?;

        let body: LoadBalancerList = self.handle_response(response).await?;
        Ok(body.load_balancers)
    }

    /// Wait until a load balancer becomes `ACTIVE`
    pub async fn await_load_balancer_active(
        &self,
        zone: &str,
        id: u64,
        config: AwaitConfig,
    ) -> std::result::Result<LoadBalancer, AwaitError> {
        let provisioning = LoadBalancerProvisioning::new(self, zone);
        JobAwaiter::new(&provisioning, config).await_one(id).await
    }
}

/// Treats load balancer provisioning as a job: `ACTIVE` is success, and
/// statuses that never lead to `ACTIVE` are failures
pub struct LoadBalancerProvisioning<'a> {
    client: &'a RackspaceClient,
    zone: &'a str,
}

impl<'a> LoadBalancerProvisioning<'a> {
    pub fn new(client: &'a RackspaceClient, zone: &'a str) -> Self {
        Self { client, zone }
    }
}

#[async_trait]
impl<'a> JobStatusProvider for LoadBalancerProvisioning<'a> {
    type Id = u64;
    type Snapshot = LoadBalancer;

    async fn fetch_status(&self, id: &u64) -> Result<LoadBalancer> {
        self.client.get_load_balancer(self.zone, *id).await
    }

    fn classify(&self, lb: &LoadBalancer) -> JobState {
        classify_load_balancer(lb)
    }
}

fn classify_load_balancer(lb: &LoadBalancer) -> JobState {
    match lb.status {
        LoadBalancerStatus::Active => JobState::Succeeded,
        status if status.is_failure() => JobState::Failed(JobErrorDetail {
            code: None,
            message: Some(format!("load balancer {} is {}", lb.name, status)),
            details: None,
        }),
        _ => JobState::Pending,
    }
}

/// `{"loadBalancer": ...}` wrapper used for single-resource bodies
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadBalancerEnvelope<T> {
    load_balancer: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadBalancerList {
    #[serde(default)]
    load_balancers: Vec<LoadBalancer>,
}
