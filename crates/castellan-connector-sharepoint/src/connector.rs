//! SharePoint connector wiring.

use castellan_connector::async_trait;
use castellan_connector::error::{ConnectorError, ConnectorResult};
use castellan_connector::traits::{Connector, ConnectorMetadata};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::auth::{GraphTokenCache, SharePointTokenCache};
use crate::config::{SharePointConfig, SharePointCredentials};
use crate::digest::FormDigestCache;
use crate::graph_client::GraphClient;
use crate::groups::GroupSyncer;
use crate::rest_client::SharePointRestClient;
use crate::security_principals::SecurityPrincipalSyncer;
use crate::sites::SiteSyncer;
use crate::users::UserSyncer;

/// Connector for SharePoint Online sites, groups, and users.
///
/// Holds the shared HTTP client and both token caches; the per-type
/// syncers returned by the accessor methods all reuse them.
pub struct SharePointConnector {
    config: Arc<SharePointConfig>,
    graph: GraphClient,
    rest: SharePointRestClient,
}

impl SharePointConnector {
    /// Creates a connector from validated configuration and credentials.
    pub fn new(config: SharePointConfig, credentials: SharePointCredentials) -> Self {
        let config = Arc::new(config);
        let credentials = Arc::new(credentials);
        let http_client = reqwest::Client::new();

        let graph_tokens =
            GraphTokenCache::new(config.clone(), credentials.clone(), http_client.clone());
        let graph = GraphClient::new(config.clone(), graph_tokens, http_client.clone());

        let sharepoint_tokens =
            SharePointTokenCache::new(config.clone(), credentials, http_client.clone());
        let digests = Arc::new(FormDigestCache::new(
            sharepoint_tokens.clone(),
            http_client.clone(),
        ));
        let rest = SharePointRestClient::new(sharepoint_tokens, digests, http_client);

        Self {
            config,
            graph,
            rest,
        }
    }

    /// The syncer for site resources.
    #[must_use]
    pub fn site_syncer(&self) -> SiteSyncer {
        SiteSyncer::new(self.config.clone(), self.graph.clone(), self.rest.clone())
    }

    /// The syncer and provisioner for SharePoint group resources.
    #[must_use]
    pub fn group_syncer(&self) -> GroupSyncer {
        GroupSyncer::new(self.config.clone(), self.graph.clone(), self.rest.clone())
    }

    /// The syncer for user resources.
    #[must_use]
    pub fn user_syncer(&self) -> UserSyncer {
        UserSyncer::new(self.config.clone(), self.graph.clone(), self.rest.clone())
    }

    /// The syncer for security principal resources.
    #[must_use]
    pub fn security_principal_syncer(&self) -> SecurityPrincipalSyncer {
        SecurityPrincipalSyncer::new(self.config.clone(), self.graph.clone(), self.rest.clone())
    }
}

#[async_trait]
impl Connector for SharePointConnector {
    fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            display_name: "SharePoint".to_string(),
            description: "Syncs SharePoint Online sites, groups, users, and security principals"
                .to_string(),
        }
    }

    /// Exercises the Graph credentials by listing the first page of sites.
    /// Certificate problems surface lazily on the first SharePoint REST
    /// call, since they cannot be checked without a site to call.
    #[instrument(skip(self), fields(tenant_id = %self.config.tenant_id))]
    async fn validate(&self) -> ConnectorResult<()> {
        let page = self
            .graph
            .list_sites(None)
            .await
            .map_err(ConnectorError::from)?;
        info!(count = page.sites.len(), "Validated Graph credentials");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_connector() -> SharePointConnector {
        let config = SharePointConfig::builder()
            .tenant_id("tenant-123")
            .sharepoint_domain("contoso")
            .graph_endpoint("http://127.0.0.1:1")
            .login_endpoint("http://127.0.0.1:1")
            .build()
            .unwrap();
        let credentials = SharePointCredentials {
            client_id: "client".to_string(),
            client_secret: SecretString::from("secret"),
            pfx_certificate: String::new(),
            pfx_password: SecretString::from(""),
        };
        SharePointConnector::new(config, credentials)
    }

    #[test]
    fn test_metadata() {
        let metadata = test_connector().metadata();
        assert_eq!(metadata.display_name, "SharePoint");
    }

    #[tokio::test]
    async fn test_validate_fails_without_reachable_endpoint() {
        assert!(test_connector().validate().await.is_err());
    }

    #[test]
    fn test_syncers_expose_distinct_resource_types() {
        use castellan_connector::traits::ResourceSyncer;

        let connector = test_connector();
        let ids = [
            connector.site_syncer().resource_type().id.clone(),
            connector.group_syncer().resource_type().id.clone(),
            connector.user_syncer().resource_type().id.clone(),
            connector
                .security_principal_syncer()
                .resource_type()
                .id
                .clone(),
        ];
        assert_eq!(
            ids,
            [
                "site".to_string(),
                "sharepoint-group".to_string(),
                "user".to_string(),
                "security-principal".to_string(),
            ]
        );
    }
}
