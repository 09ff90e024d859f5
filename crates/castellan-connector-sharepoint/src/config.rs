//! Configuration for the SharePoint connector.

use chrono::Duration;
use secrecy::SecretString;

use crate::error::{SharePointError, SharePointResult};

/// Default Microsoft Graph endpoint.
const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.microsoft.com";

/// Default Entra login endpoint.
const DEFAULT_LOGIN_ENDPOINT: &str = "https://login.microsoftonline.com";

/// Graph page size for site listings.
const DEFAULT_PAGE_SIZE: u32 = 999;

/// Credentials for the app registration used by the connector.
///
/// Graph calls authenticate with the client secret; SharePoint REST calls
/// authenticate with a JWT assertion signed by the PFX certificate.
#[derive(Debug, Clone)]
pub struct SharePointCredentials {
    /// Application (client) ID.
    pub client_id: String,
    /// Client secret for the Graph client-credentials flow.
    pub client_secret: SecretString,
    /// PKCS#12 bundle, base64-encoded or raw (as loaded from a file).
    pub pfx_certificate: String,
    /// Password protecting the PKCS#12 bundle.
    pub pfx_password: SecretString,
}

/// Connector configuration.
#[derive(Debug, Clone)]
pub struct SharePointConfig {
    /// Directory (tenant) ID.
    pub tenant_id: String,
    /// SharePoint tenant domain, the `{domain}` of
    /// `https://{domain}.sharepoint.com`.
    pub sharepoint_domain: String,
    /// Graph endpoint; override for sovereign clouds or tests.
    pub graph_endpoint: String,
    /// Login endpoint; override for sovereign clouds or tests.
    pub login_endpoint: String,
    /// Keep SharePointHome "OrgLinks" groups and rolemanager claims
    /// principals instead of filtering them.
    ///
    /// Surfacing these requires the app to hold `Sites.FullControl.All`,
    /// which is full admin rights over every site.
    pub dont_filter_special_groups: bool,
    /// Graph page size for site listings.
    pub page_size: u32,
    /// Validity window of the signed JWT assertion, also used as the
    /// SharePoint bearer token cache lifetime.
    pub assertion_validity: Duration,
    /// Clock-skew allowance subtracted from the assertion's `nbf` claim.
    pub assertion_not_before: Duration,
}

impl SharePointConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> SharePointConfigBuilder {
        SharePointConfigBuilder::default()
    }

    /// Base URL for Graph API requests.
    #[must_use]
    pub fn graph_base_url(&self) -> String {
        format!("{}/v1.0", self.graph_endpoint)
    }

    /// OAuth scope for Graph tokens.
    #[must_use]
    pub fn graph_scope(&self) -> String {
        format!("{}/.default", self.graph_endpoint)
    }

    /// OAuth scope for SharePoint REST tokens.
    #[must_use]
    pub fn sharepoint_scope(&self) -> String {
        format!("https://{}.sharepoint.com/.default", self.sharepoint_domain)
    }

    /// Token endpoint for this tenant.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.login_endpoint, self.tenant_id)
    }
}

/// Builder for [`SharePointConfig`].
#[derive(Debug, Clone, Default)]
pub struct SharePointConfigBuilder {
    tenant_id: Option<String>,
    sharepoint_domain: Option<String>,
    graph_endpoint: Option<String>,
    login_endpoint: Option<String>,
    dont_filter_special_groups: bool,
    page_size: Option<u32>,
}

impl SharePointConfigBuilder {
    /// Sets the directory (tenant) ID.
    #[must_use]
    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Sets the SharePoint tenant domain.
    #[must_use]
    pub fn sharepoint_domain(mut self, domain: impl Into<String>) -> Self {
        self.sharepoint_domain = Some(domain.into());
        self
    }

    /// Overrides the Graph endpoint.
    #[must_use]
    pub fn graph_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.graph_endpoint = Some(endpoint.into());
        self
    }

    /// Overrides the login endpoint.
    #[must_use]
    pub fn login_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.login_endpoint = Some(endpoint.into());
        self
    }

    /// Keeps special SharePoint groups and rolemanager claims principals.
    #[must_use]
    pub fn dont_filter_special_groups(mut self, keep: bool) -> Self {
        self.dont_filter_special_groups = keep;
        self
    }

    /// Sets the Graph page size (1..=999).
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> SharePointResult<SharePointConfig> {
        let tenant_id = self
            .tenant_id
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SharePointError::Config("tenant_id is required".to_string()))?;
        let sharepoint_domain = self
            .sharepoint_domain
            .filter(|d| !d.is_empty())
            .ok_or_else(|| SharePointError::Config("sharepoint_domain is required".to_string()))?;

        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 || page_size > 999 {
            return Err(SharePointError::Config(format!(
                "page_size must be between 1 and 999, got {page_size}"
            )));
        }

        Ok(SharePointConfig {
            tenant_id,
            sharepoint_domain,
            graph_endpoint: self
                .graph_endpoint
                .map(|e| e.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GRAPH_ENDPOINT.to_string()),
            login_endpoint: self
                .login_endpoint
                .map(|e| e.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_LOGIN_ENDPOINT.to_string()),
            dont_filter_special_groups: self.dont_filter_special_groups,
            page_size,
            assertion_validity: Duration::hours(1),
            assertion_not_before: Duration::minutes(5),
        })
    }
}
