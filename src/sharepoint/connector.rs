//! Authentication against a SharePoint site
//!
//! A connector turns a [`SiteConfig`] into an authenticated session. Nothing
//! is cached: every call performs the full sign-in again.

use super::auth::{
    acquire_token_for_app, acquire_token_for_user, AuthEndpoints, CredentialFlow,
    EmailHeuristic, IdentityPolicy,
};
use super::client::{SharePointClient, SiteAccess, SiteUrl, DEFAULT_PAGE_SIZE};
use super::error::{Result, SharePointError};
use crate::config::SiteConfig;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Produces authenticated sessions from connection parameters
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: SiteAccess;

    async fn authenticate(&self, config: &SiteConfig) -> Result<Self::Session>;
}

/// Connector for the SharePoint REST API
#[derive(Clone)]
pub struct HttpConnector {
    policy: Arc<dyn IdentityPolicy>,
    endpoints: AuthEndpoints,
    page_size: u32,
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpConnector {
    pub fn new() -> Self {
        HttpConnector {
            policy: Arc::new(EmailHeuristic),
            endpoints: AuthEndpoints::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Replace the rule that picks user vs application sign-in
    pub fn with_policy(mut self, policy: impl IdentityPolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Override the STS endpoints (sovereign clouds, test servers)
    pub fn with_endpoints(mut self, endpoints: AuthEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// `$top` used when loading list items
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Credential flow the configured policy picks for a principal
    pub fn flow_for(&self, client_id: &str) -> CredentialFlow {
        self.policy.flow(client_id)
    }
}

#[async_trait]
impl Connector for HttpConnector {
    type Session = SharePointClient;

    async fn authenticate(&self, config: &SiteConfig) -> Result<SharePointClient> {
        let site = SiteUrl::parse(config.require_url()?)?;
        let client_id = config.require_client_id()?;
        let client_secret = config.require_client_secret()?;

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| SharePointError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let flow = self.flow_for(client_id);
        debug!(site = %site.base(), ?flow, "Authenticating");

        let credential = match flow {
            CredentialFlow::User => {
                acquire_token_for_user(&http, &site, &self.endpoints, client_id, client_secret)
                    .await?
            }
            CredentialFlow::Application => {
                acquire_token_for_app(&http, &site, &self.endpoints, client_id, client_secret)
                    .await?
            }
        };

        let client = SharePointClient::new(http, site, credential).with_page_size(self.page_size);

        let title = client.web_title().await?;
        info!("Authentication successful");
        info!(title = %title, "Web site title: {}", title);

        Ok(client)
    }
}
