//! Cloud DNS request bodies

use serde::{Deserialize, Serialize};

/// Changes to apply to a single domain
///
/// Unset fields are left untouched by the service.
///
/// ```
/// use rackspace_core::dto::dns::UpdateDomain;
///
/// let update = UpdateDomain::builder()
///     .email("jcloudie@alt-jclouds-example.com")
///     .ttl(600001)
///     .comment("Hello Domain Update")
///     .build();
/// assert!(!update.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDomain {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl UpdateDomain {
    pub fn builder() -> UpdateDomainBuilder {
        UpdateDomainBuilder::default()
    }

    /// True when the update would not change anything
    pub fn is_empty(&self) -> bool {
        self.email_address.is_none() && self.ttl.is_none() && self.comment.is_none()
    }
}

#[derive(Debug, Default)]
pub struct UpdateDomainBuilder {
    inner: UpdateDomain,
}

impl UpdateDomainBuilder {
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.inner.email_address = Some(email.into());
        self
    }

    pub fn ttl(mut self, ttl: u32) -> Self {
        self.inner.ttl = Some(ttl);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.inner.comment = Some(comment.into());
        self
    }

    pub fn build(self) -> UpdateDomain {
        self.inner
    }
}

/// Batch body for setting the contact email on many domains in one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEmailUpdate {
    pub domains: Vec<DomainEmail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEmail {
    pub id: u64,
    pub email_address: String,
}

impl DomainEmailUpdate {
    pub fn new(domain_ids: impl IntoIterator<Item = u64>, email: &str) -> Self {
        Self {
            domains: domain_ids
                .into_iter()
                .map(|id| DomainEmail {
                    id,
                    email_address: email.to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_domain_skips_unset_fields() {
        let update = UpdateDomain::builder().ttl(600001).build();
        let value = serde_json::to_value(&update).unwrap();

        assert_eq!(value, serde_json::json!({"ttl": 600001}));
    }

    #[test]
    fn test_update_domain_full_body() {
        let update = UpdateDomain::builder()
            .email("jcloudie@alt-jclouds-example.com")
            .ttl(600001)
            .comment("Hello Domain Update")
            .build();
        let value = serde_json::to_value(&update).unwrap();

        assert_eq!(value["emailAddress"], "jcloudie@alt-jclouds-example.com");
        assert_eq!(value["comment"], "Hello Domain Update");
    }

    #[test]
    fn test_empty_update() {
        assert!(UpdateDomain::builder().build().is_empty());
    }

    #[test]
    fn test_email_update_body() {
        let body = DomainEmailUpdate::new([1, 2], "jclouder@jclouds-example.com");
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["domains"].as_array().unwrap().len(), 2);
        assert_eq!(value["domains"][1]["id"], 2);
        assert_eq!(value["domains"][1]["emailAddress"], "jclouder@jclouds-example.com");
    }
}
