//! Identity authentication and session handling
//!
//! Authenticates with a username and API key against Rackspace Identity v2,
//! keeps the token and service catalog, and revokes the token on close.

use std::fmt;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::RackspaceClient;
use crate::error::{ClientError, Result};

/// Tokens this close to expiry are renewed before use
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Username and API key for Rackspace Identity
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub api_key: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Services the client knows how to reach, keyed by catalog type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Service {
    Dns,
    LoadBalancers,
}

impl Service {
    pub(crate) fn catalog_type(self) -> &'static str {
        match self {
            Service::Dns => "rax:dns",
            Service::LoadBalancers => "rax:load-balancer",
        }
    }
}

/// An authenticated identity session
#[derive(Clone)]
pub(crate) struct Session {
    pub(crate) token: String,
    pub(crate) expires: DateTime<Utc>,
    pub(crate) tenant_id: String,
    catalog: Vec<CatalogEntry>,
}

impl Session {
    /// Public URL for a service, optionally restricted to a region
    ///
    /// Global services (Cloud DNS) list a single endpoint without a region;
    /// they match any requested region.
    pub(crate) fn endpoint(&self, service: Service, region: Option<&str>) -> Result<String> {
        let entry = self
            .catalog
            .iter()
            .find(|entry| entry.service_type == service.catalog_type())
            .ok_or_else(|| ClientError::EndpointNotFound {
                service: service.catalog_type(),
                region: None,
            })?;

        let endpoint = match region {
            Some(wanted) => entry
                .endpoints
                .iter()
                .find(|ep| {
                    ep.region
                        .as_deref()
                        .is_none_or(|r| r.eq_ignore_ascii_case(wanted))
                }),
            None => entry.endpoints.first(),
        };

        endpoint
            .map(|ep| ep.public_url.trim_end_matches('/').to_string())
            .ok_or_else(|| ClientError::EndpointNotFound {
                service: service.catalog_type(),
                region: region.map(str::to_string),
            })
    }

    pub(crate) fn is_expiring(&self, now: DateTime<Utc>) -> bool {
        self.expires - ChronoDuration::seconds(EXPIRY_MARGIN_SECS) <= now
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("tenant_id", &self.tenant_id)
            .field("expires", &self.expires)
            .finish_non_exhaustive()
    }
}

impl From<Access> for Session {
    fn from(access: Access) -> Self {
        Self {
            token: access.token.id,
            expires: access.token.expires,
            tenant_id: access.token.tenant.id,
            catalog: access.service_catalog,
        }
    }
}

impl RackspaceClient {
    /// Returns a usable session, authenticating first if there is none or
    /// the current token is about to expire
    pub(crate) async fn session(&self) -> Result<Session> {
        {
            let guard = self.session.read().await;
            if let Some(session) = &*guard {
                if !session.is_expiring(Utc::now()) {
                    return Ok(session.clone());
                }
            }
        }

        let mut guard = self.session.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(session) = &*guard {
            if !session.is_expiring(Utc::now()) {
                return Ok(session.clone());
            }
        }

        let session = self.authenticate().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Authenticates with the configured credentials
    async fn authenticate(&self) -> Result<Session> {
        let url = format!("{}/v2.0/tokens", self.config.identity_url());
        debug!("Authenticating {} against {}", self.credentials.username, url);

        let response = self
            .http
            .post(&url)
            .json(&AuthRequest::from(&self.credentials))
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::AuthenticationFailed(format!(
                "identity returned {}: {}",
                status, body
            )));
        }

        let access: AccessResponse = self.handle_response(response).await?;
        let session = Session::from(access.access);

        info!(
            "Authenticated as {} (tenant {}, token expires {})",
            self.credentials.username, session.tenant_id, session.expires
        );

        Ok(session)
    }

    /// Revokes the current token and forgets the session
    ///
    /// Closing a client that never authenticated is a no-op. The session is
    /// dropped even when revocation fails, so a failed close still leaves the
    /// client unusable until it re-authenticates.
    pub async fn close(&self) -> Result<()> {
        let Some(session) = self.session.write().await.take() else {
            debug!("Close requested with no active session");
            return Ok(());
        };

        let url = format!("{}/v2.0/tokens", self.config.identity_url());
        let response = self
            .http
            .delete(&url)
            .header(AUTH_TOKEN_HEADER, &session.token)
            .send()
            .await?;

        self.handle_empty_response(response).await?;
        info!("Revoked identity token for {}", self.credentials.username);
        Ok(())
    }
}

pub(crate) const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    auth: AuthBody<'a>,
}

#[derive(Debug, Serialize)]
struct AuthBody<'a> {
    #[serde(rename = "RAX-KSKEY:apiKeyCredentials")]
    api_key_credentials: ApiKeyCredentials<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeyCredentials<'a> {
    username: &'a str,
    api_key: &'a str,
}

impl<'a> From<&'a Credentials> for AuthRequest<'a> {
    fn from(credentials: &'a Credentials) -> Self {
        Self {
            auth: AuthBody {
                api_key_credentials: ApiKeyCredentials {
                    username: &credentials.username,
                    api_key: &credentials.api_key,
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccessResponse {
    access: Access,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Access {
    token: Token,
    #[serde(default)]
    service_catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct Token {
    id: String,
    expires: DateTime<Utc>,
    tenant: Tenant,
}

#[derive(Debug, Deserialize)]
struct Tenant {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, Deserialize)]
struct Endpoint {
    #[serde(default)]
    region: Option<String>,
    #[serde(rename = "publicURL")]
    public_url: String,
}
