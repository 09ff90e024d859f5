//! Security principal resource syncer.
//!
//! Surfaces the SharePoint-native security principals a site knows about,
//! so operators can see opaque claims entries like "Everyone" next to the
//! grants that reference them. These resources expose no entitlements of
//! their own.

use castellan_connector::async_trait;
use castellan_connector::error::{ConnectorError, ConnectorResult};
use castellan_connector::pagination::PageCursor;
use castellan_connector::traits::ResourceSyncer;
use castellan_connector::types::{Entitlement, Grant, Resource, ResourceId, ResourceType};
use std::sync::Arc;
use tracing::instrument;

use crate::config::SharePointConfig;
use crate::graph_client::GraphClient;
use crate::login_name::{classify, reasonable_id_from_login_name, PrincipalKind};
use crate::model::{PrincipalType, SharePointUser};
use crate::rest_client::SharePointRestClient;

/// Resource type ID for security principals.
pub(crate) const SECURITY_PRINCIPAL_TYPE_ID: &str = "security-principal";

pub(crate) fn security_principal_resource_type() -> ResourceType {
    ResourceType::group(SECURITY_PRINCIPAL_TYPE_ID, "Security Principal")
}

/// Syncs SharePoint-native security principals per site.
pub struct SecurityPrincipalSyncer {
    resource_type: ResourceType,
    config: Arc<SharePointConfig>,
    graph: GraphClient,
    rest: SharePointRestClient,
}

impl SecurityPrincipalSyncer {
    pub(crate) fn new(
        config: Arc<SharePointConfig>,
        graph: GraphClient,
        rest: SharePointRestClient,
    ) -> Self {
        Self {
            resource_type: security_principal_resource_type(),
            config,
            graph,
            rest,
        }
    }

    /// Whether a site principal record belongs in this listing.
    fn is_native_security_principal(&self, user: &SharePointUser) -> ConnectorResult<bool> {
        if user.principal_type != PrincipalType::SecurityGroup {
            return Ok(false);
        }
        match classify(&user.login_name).map_err(ConnectorError::from)? {
            // Entra-owned principals are synced by the directory connector.
            PrincipalKind::EntraGroup { .. } | PrincipalKind::TenantGroup { .. } => Ok(false),
            PrincipalKind::RoleManager { .. } => Ok(self.config.dont_filter_special_groups),
            PrincipalKind::User => Ok(true),
            PrincipalKind::System => Ok(false),
        }
    }

    fn principal_to_resource(&self, user: &SharePointUser) -> Resource {
        Resource::new(
            ResourceId::new(&self.resource_type, &user.login_name),
            user.title.clone(),
        )
        .with_profile_value(
            "reasonableId",
            reasonable_id_from_login_name(&user.login_name),
        )
    }
}

#[async_trait]
impl ResourceSyncer for SecurityPrincipalSyncer {
    fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    #[instrument(skip(self, cursor))]
    async fn list(
        &self,
        parent: Option<&ResourceId>,
        mut cursor: PageCursor,
    ) -> ConnectorResult<(Vec<Resource>, PageCursor)> {
        cursor.set_next(None);
        let Some(parent) = parent else {
            return Ok((Vec::new(), cursor));
        };

        let site = self
            .graph
            .get_site_by_id(&parent.resource)
            .await
            .map_err(ConnectorError::from)?;
        let users = self
            .rest
            .list_site_users(&site.web_url)
            .await
            .map_err(ConnectorError::from)?;

        let mut resources = Vec::new();
        for user in &users {
            if self.is_native_security_principal(user)? {
                resources.push(self.principal_to_resource(user));
            }
        }
        Ok((resources, cursor))
    }

    async fn entitlements(&self, _resource: &Resource) -> ConnectorResult<Vec<Entitlement>> {
        Ok(Vec::new())
    }

    async fn grants(&self, _resource: &Resource) -> ConnectorResult<Vec<Grant>> {
        Ok(Vec::new())
    }
}
