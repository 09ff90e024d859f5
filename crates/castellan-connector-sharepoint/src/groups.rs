//! SharePoint group resource syncer and provisioner.
//!
//! Groups are site-scoped: listing requires a parent site resource, and a
//! group's addressable ID is its OData resource URL
//! (`.../_api/Web/SiteGroups/GetById(N)`), which carries both the site web
//! and the site-local group number needed for membership calls.

use castellan_connector::async_trait;
use castellan_connector::error::{ConnectorError, ConnectorResult};
use castellan_connector::pagination::PageCursor;
use castellan_connector::traits::{Provisioner, ResourceSyncer};
use castellan_connector::types::{Entitlement, Grant, Resource, ResourceId, ResourceType};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::config::SharePointConfig;
use crate::graph_client::GraphClient;
use crate::grants::{entitlement_slug_from_title, map_principal_to_grant, GROUP_TYPE_ID, USER_TYPE_ID};
use crate::login_name::{build_login_name, looks_like_uuid};
use crate::model::SiteGroup;
use crate::rest_client::SharePointRestClient;

/// Resource type ID for SharePoint-native groups.
pub(crate) const SHAREPOINT_GROUP_TYPE_ID: &str = "sharepoint-group";

/// Title marker of the hidden groups SharePoint creates for the
/// SharePointHome "OrgLinks" feature.
const ORG_LINKS_MARKER: &str = "SharePointHome OrgLinks";

pub(crate) fn group_resource_type() -> ResourceType {
    ResourceType::group(SHAREPOINT_GROUP_TYPE_ID, "SharePoint Group")
}

/// Syncs site-scoped SharePoint groups and provisions their membership.
pub struct GroupSyncer {
    resource_type: ResourceType,
    config: Arc<SharePointConfig>,
    graph: GraphClient,
    rest: SharePointRestClient,
}

impl GroupSyncer {
    pub(crate) fn new(
        config: Arc<SharePointConfig>,
        graph: GraphClient,
        rest: SharePointRestClient,
    ) -> Self {
        Self {
            resource_type: group_resource_type(),
            config,
            graph,
            rest,
        }
    }

    fn group_to_resource(&self, group: &SiteGroup, parent: &ResourceId) -> Resource {
        let mut resource = Resource::new(
            ResourceId::new(&self.resource_type, &group.odata_id),
            group.title.clone(),
        )
        .with_parent(parent.clone())
        .with_profile_value("loginName", group.login_name.clone())
        .with_profile_value("ownerTitle", group.owner_title.clone())
        .with_profile_value(
            "onlyAllowMembersViewMembership",
            group.only_allow_members_view_membership,
        );

        if let Some(description) = &group.description {
            resource = resource.with_profile_value("description", description.clone());
        }
        resource
    }
}

/// Extracts the site-local group number from a group's OData resource URL.
pub(crate) fn group_id_from_odata_id(odata_id: &str) -> ConnectorResult<i64> {
    odata_id
        .rsplit_once("/GetById(")
        .and_then(|(_, tail)| tail.strip_suffix(')'))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| ConnectorError::ResourceBuild {
            kind: SHAREPOINT_GROUP_TYPE_ID.to_string(),
            message: format!("no group ID in OData URL '{odata_id}'"),
        })
}

/// Splits a group's OData resource URL into its site web URL base and
/// site-local group number.
fn group_address(odata_id: &str) -> ConnectorResult<(String, i64)> {
    let web_url = crate::login_name::guess_site_web_url_base(odata_id)
        .map_err(|e| ConnectorError::ResourceBuild {
            kind: SHAREPOINT_GROUP_TYPE_ID.to_string(),
            message: e.to_string(),
        })?;
    let group_id = group_id_from_odata_id(odata_id)?;
    Ok((web_url, group_id))
}

#[async_trait]
impl ResourceSyncer for GroupSyncer {
    fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    /// Lists the groups of the parent site. Without a parent there is
    /// nothing to list; groups do not exist at tenant scope.
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
        let groups = self
            .rest
            .list_site_groups(&site.web_url)
            .await
            .map_err(ConnectorError::from)?;

        let resources: Vec<Resource> = groups
            .iter()
            .filter(|group| {
                if !self.config.dont_filter_special_groups
                    && group.title.contains(ORG_LINKS_MARKER)
                {
                    debug!(group = %group.title, "Filtering OrgLinks group");
                    return false;
                }
                true
            })
            .map(|group| self.group_to_resource(group, parent))
            .collect();

        Ok((resources, cursor))
    }

    async fn entitlements(&self, resource: &Resource) -> ConnectorResult<Vec<Entitlement>> {
        let slug = entitlement_slug_from_title(&resource.display_name);
        Ok(vec![Entitlement::assignment(resource, slug)
            .grantable_to(&ResourceType::user(USER_TYPE_ID, "User"))
            .grantable_to(&ResourceType::group(GROUP_TYPE_ID, "Group"))])
    }

    #[instrument(skip(self, resource), fields(group = %resource.id))]
    async fn grants(&self, resource: &Resource) -> ConnectorResult<Vec<Grant>> {
        let (web_url, group_id) = group_address(&resource.id.resource)?;
        let slug = entitlement_slug_from_title(&resource.display_name);
        let members = self
            .rest
            .list_users_in_group(&web_url, group_id)
            .await
            .map_err(ConnectorError::from)?;

        let mut grants = Vec::new();
        for member in &members {
            match map_principal_to_grant(
                resource,
                &slug,
                member,
                self.config.dont_filter_special_groups,
            ) {
                Ok(Some(grant)) => grants.push(grant),
                Ok(None) => {}
                Err(err) if err.is_unrecognized_principal() => {
                    warn!(login_name = %member.login_name, %err, "Skipping unrepresentable group member");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(grants)
    }
}

#[async_trait]
impl Provisioner for GroupSyncer {
    /// Adds the principal to the SharePoint group behind the entitlement.
    ///
    /// A user principal handed over as a directory object ID is resolved
    /// to its user principal name first; SharePoint cannot address users
    /// by object ID, and a bare GUID would otherwise be mistaken for an
    /// Entra group.
    #[instrument(skip(self))]
    async fn grant(
        &self,
        entitlement: &Entitlement,
        principal: &ResourceId,
    ) -> ConnectorResult<()> {
        let (web_url, group_id) = group_address(&entitlement.resource_id.resource)?;

        let value = if principal.resource_type == USER_TYPE_ID
            && looks_like_uuid(&principal.resource)
        {
            self.graph
                .get_user_principal_name(&principal.resource)
                .await
                .map_err(ConnectorError::from)?
        } else {
            principal.resource.clone()
        };
        let login_name = build_login_name(&value);

        self.rest
            .add_user_to_group(&web_url, group_id, &login_name)
            .await
            .map_err(ConnectorError::from)?;
        Ok(())
    }

    /// Removes the granted principal from the group.
    ///
    /// Removal is by site-local user ID, so the current membership is
    /// listed and matched against the grant's principal first.
    #[instrument(skip(self, grant), fields(group = %grant.resource_id, principal = %grant.principal))]
    async fn revoke(&self, grant: &Grant) -> ConnectorResult<()> {
        let (web_url, group_id) = group_address(&grant.resource_id.resource)?;
        let members = self
            .rest
            .list_users_in_group(&web_url, group_id)
            .await
            .map_err(ConnectorError::from)?;

        let placeholder = Resource::new(grant.resource_id.clone(), String::new());
        for member in &members {
            let mapped = match map_principal_to_grant(
                &placeholder,
                &grant.entitlement,
                member,
                self.config.dont_filter_special_groups,
            ) {
                Ok(Some(candidate)) => candidate,
                Ok(None) => continue,
                Err(err) if err.is_unrecognized_principal() => continue,
                Err(err) => return Err(err.into()),
            };
            if mapped.principal == grant.principal {
                self.rest
                    .remove_user_from_group(&web_url, group_id, member.id)
                    .await
                    .map_err(ConnectorError::from)?;
                return Ok(());
            }
        }

        Err(ConnectorError::Operation {
            message: format!(
                "principal '{}' is not a member of group '{}'",
                grant.principal, grant.resource_id
            ),
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_id_from_odata_id() {
        let id = group_id_from_odata_id(
            "https://tenant.sharepoint.com/sites/Crisis/_api/Web/SiteGroups/GetById(5)",
        )
        .unwrap();
        assert_eq!(id, 5);
    }

    #[test]
    fn test_group_id_missing_is_build_error() {
        let err = group_id_from_odata_id("https://tenant.sharepoint.com/sites/Crisis").unwrap_err();
        assert!(matches!(err, ConnectorError::ResourceBuild { .. }));
    }

    #[test]
    fn test_group_id_rejects_non_numeric() {
        let err = group_id_from_odata_id(
            "https://tenant.sharepoint.com/sites/Crisis/_api/Web/SiteGroups/GetById(five)",
        )
        .unwrap_err();
        assert!(matches!(err, ConnectorError::ResourceBuild { .. }));
    }

    #[test]
    fn test_group_address_splits_web_and_id() {
        let (web_url, group_id) = group_address(
            "https://tenant.sharepoint.com/sites/Crisis/_api/Web/SiteGroups/GetById(12)",
        )
        .unwrap();
        assert_eq!(web_url, "https://tenant.sharepoint.com/sites/Crisis");
        assert_eq!(group_id, 12);
    }
}
