//! Site resource syncer.

use castellan_connector::error::{ConnectorError, ConnectorResult};
use castellan_connector::pagination::PageCursor;
use castellan_connector::types::{Entitlement, Grant, Resource, ResourceId, ResourceType};
use castellan_connector::async_trait;
use castellan_connector::traits::ResourceSyncer;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::config::SharePointConfig;
use crate::graph_client::GraphClient;
use crate::grants::map_principal_to_grant;
use crate::model::Site;
use crate::rest_client::SharePointRestClient;

/// Resource type ID for sites.
pub(crate) const SITE_TYPE_ID: &str = "site";

/// Entitlement slug for site collection administrators.
const ADMIN_SLUG: &str = "admin";

pub(crate) fn site_resource_type() -> ResourceType {
    ResourceType::group(SITE_TYPE_ID, "Site")
}

/// Syncs SharePoint sites from the Graph listing.
pub struct SiteSyncer {
    resource_type: ResourceType,
    config: Arc<SharePointConfig>,
    graph: GraphClient,
    rest: SharePointRestClient,
}

impl SiteSyncer {
    pub(crate) fn new(
        config: Arc<SharePointConfig>,
        graph: GraphClient,
        rest: SharePointRestClient,
    ) -> Self {
        Self {
            resource_type: site_resource_type(),
            config,
            graph,
            rest,
        }
    }

    fn site_to_resource(&self, site: &Site) -> Resource {
        let display_name = if site.display_name.is_empty() {
            site.name.clone()
        } else {
            site.display_name.clone()
        };

        let mut resource = Resource::new(
            ResourceId::new(&self.resource_type, &site.id),
            display_name,
        )
        .with_profile_value("webUrl", site.web_url.clone())
        .with_profile_value("name", site.name.clone());

        if let Some(collection) = &site.site_collection {
            resource = resource.with_profile_value("hostname", collection.hostname.clone());
        }
        resource
    }
}

/// Reads the site web URL recorded on a site resource's profile.
pub(crate) fn site_web_url(resource: &Resource) -> ConnectorResult<String> {
    resource
        .profile
        .get("webUrl")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ConnectorError::ResourceBuild {
            kind: SITE_TYPE_ID.to_string(),
            message: format!("resource '{}' has no webUrl in its profile", resource.id),
        })
}

#[async_trait]
impl ResourceSyncer for SiteSyncer {
    fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    #[instrument(skip(self, cursor))]
    async fn list(
        &self,
        _parent: Option<&ResourceId>,
        mut cursor: PageCursor,
    ) -> ConnectorResult<(Vec<Resource>, PageCursor)> {
        let page = self
            .graph
            .list_sites(cursor.token())
            .await
            .map_err(ConnectorError::from)?;

        let resources: Vec<Resource> = page
            .sites
            .iter()
            .filter(|site| {
                if site.is_personal_site {
                    debug!(site_id = %site.id, "Skipping personal site");
                    return false;
                }
                true
            })
            .map(|site| self.site_to_resource(site))
            .collect();

        cursor.set_next(page.next_link);
        Ok((resources, cursor))
    }

    async fn entitlements(&self, resource: &Resource) -> ConnectorResult<Vec<Entitlement>> {
        Ok(vec![Entitlement::permission(resource, ADMIN_SLUG)
            .with_display_name(format!("Site Collection Administrator of {}", resource.display_name))])
    }

    /// Grants the admin entitlement to every site collection administrator.
    #[instrument(skip(self, resource), fields(site = %resource.id))]
    async fn grants(&self, resource: &Resource) -> ConnectorResult<Vec<Grant>> {
        let web_url = site_web_url(resource)?;
        let users = self
            .rest
            .list_site_users(&web_url)
            .await
            .map_err(ConnectorError::from)?;

        let mut grants = Vec::new();
        for user in users.iter().filter(|u| u.is_site_admin) {
            match map_principal_to_grant(
                resource,
                ADMIN_SLUG,
                user,
                self.config.dont_filter_special_groups,
            ) {
                Ok(Some(grant)) => grants.push(grant),
                Ok(None) => {}
                Err(err) if err.is_unrecognized_principal() => {
                    warn!(login_name = %user.login_name, %err, "Skipping unrepresentable site admin");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(grants)
    }
}
