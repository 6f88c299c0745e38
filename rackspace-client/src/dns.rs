//! Cloud DNS endpoints

use rackspace_core::domain::dns::Domain;
use rackspace_core::domain::job::Job;
use rackspace_core::dto::dns::{DomainEmailUpdate, UpdateDomain};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use crate::RackspaceClient;
use crate::error::{ClientError, Result};
use crate::identity::Service;

/// Page size for domain listings; the service caps it at 100
const PAGE_SIZE: usize = 100;

impl RackspaceClient {
    // =============================================================================
    // Domain Query
    // =============================================================================

    /// List every domain on the account, following pagination
    pub async fn list_domains(&self) -> Result<Vec<Domain>> {
        let mut domains = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.list_domains_page(offset).await?;
            let fetched = page.domains.len();
            let more = page.has_more(domains.len() + fetched, fetched);

            debug!(
                "Fetched {} domain(s) at offset {} (total {:?})",
                fetched, offset, page.total_entries
            );
            domains.extend(page.domains);

            if !more {
                break;
            }
            offset += fetched;
        }

        Ok(domains)
    }

    async fn list_domains_page(&self, offset: usize) -> Result<DomainPage> {
        let path = format!("/domains?limit={}&offset={}", PAGE_SIZE, offset);
        let response = self
            .request(Method::GET, Service::Dns, None, &path)
            .await?
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a domain by ID, without its records or subdomains
    pub async fn get_domain(&self, domain_id: u64) -> Result<Domain> {
        let path = format!(
            "/domains/{}?showRecords=false&showSubdomains=false",
            domain_id
        );
        let response = self
            .request(Method::GET, Service::Dns, None, &path)
            .await?
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Find a domain by its exact name
    pub async fn find_domain_by_name(&self, name: &str) -> Result<Domain> {
        let domains = self.list_domains().await?;
        domain_named(domains, name).ok_or_else(|| ClientError::NotFound(format!("domain {}", name)))
    }

    // =============================================================================
    // Domain Mutation (asynchronous)
    // =============================================================================

    /// Update a single domain
    ///
    /// # Returns
    /// The job tracking the change; await it before reading the domain back
    pub async fn update_domain(&self, domain_id: u64, update: &UpdateDomain) -> Result<Job> {
        if update.is_empty() {
            return Err(ClientError::InvalidRequest(
                "domain update must change at least one field".to_string(),
            ));
        }

        let path = format!("/domains/{}", domain_id);
        let response = self
            .request(Method::PUT, Service::Dns, None, &path)
            .await?
            .json(update)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Set the contact email of many domains in one batch
    ///
    /// # Returns
    /// A single job covering every domain in the batch
    pub async fn update_domain_emails(&self, domain_ids: &[u64], email: &str) -> Result<Job> {
        if domain_ids.is_empty() {
            return Err(ClientError::InvalidRequest(
                "at least one domain id is required".to_string(),
            ));
        }

        let body = DomainEmailUpdate::new(domain_ids.iter().copied(), email);
        let response = self
            .request(Method::PUT, Service::Dns, None, "/domains")
            .await?
            .json(&body)
            .send()
            .await?;

        self.handle_response(response).await
    }
}

/// One page of `GET /domains`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DomainPage {
    #[serde(default)]
    domains: Vec<Domain>,
    #[serde(default)]
    total_entries: Option<usize>,
}

impl DomainPage {
    fn has_more(&self, seen: usize, fetched: usize) -> bool {
        if fetched == 0 {
            return false;
        }
        match self.total_entries {
            Some(total) => seen < total,
            None => fetched == PAGE_SIZE,
        }
    }
}

fn domain_named(domains: Vec<Domain>, name: &str) -> Option<Domain> {
    domains.into_iter().find(|domain| domain.name == name)
}
