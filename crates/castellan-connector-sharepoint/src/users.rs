//! User resource syncer.
//!
//! Site user lists mix real people with claims principals. Only principals
//! that are locally addressable become user resources here: federated
//! users keyed by their user principal name, and SharePoint-native
//! security principals keyed by their stripped login name. Entra groups
//! and tenant principals are owned by the directory connector and appear
//! only as grant targets.

use castellan_connector::async_trait;
use castellan_connector::error::{ConnectorError, ConnectorResult};
use castellan_connector::pagination::PageCursor;
use castellan_connector::traits::ResourceSyncer;
use castellan_connector::types::{Entitlement, Grant, Resource, ResourceId, ResourceType};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::SharePointConfig;
use crate::graph_client::GraphClient;
use crate::grants::USER_TYPE_ID;
use crate::login_name::{classify, reasonable_id_from_login_name, PrincipalKind};
use crate::model::{PrincipalType, SharePointUser};
use crate::rest_client::SharePointRestClient;

pub(crate) fn user_resource_type() -> ResourceType {
    ResourceType::user(USER_TYPE_ID, "User")
}

/// Syncs user principals from site user lists.
pub struct UserSyncer {
    resource_type: ResourceType,
    config: Arc<SharePointConfig>,
    graph: GraphClient,
    rest: SharePointRestClient,
}

impl UserSyncer {
    pub(crate) fn new(
        config: Arc<SharePointConfig>,
        graph: GraphClient,
        rest: SharePointRestClient,
    ) -> Self {
        Self {
            resource_type: user_resource_type(),
            config,
            graph,
            rest,
        }
    }

    /// Converts one site principal record into a user resource, or `None`
    /// for records this syncer does not own.
    fn user_to_resource(&self, user: &SharePointUser) -> ConnectorResult<Option<Resource>> {
        if user.is_hidden_in_ui {
            return Ok(None);
        }

        let kind = classify(&user.login_name).map_err(ConnectorError::from)?;
        let resource_id = match (&kind, user.principal_type) {
            (PrincipalKind::System, _) => return Ok(None),
            (PrincipalKind::EntraGroup { .. } | PrincipalKind::TenantGroup { .. }, _) => {
                return Ok(None)
            }
            (PrincipalKind::RoleManager { .. }, _) => {
                if !self.config.dont_filter_special_groups {
                    return Ok(None);
                }
                reasonable_id_from_login_name(&user.login_name)
            }
            (PrincipalKind::User, PrincipalType::User) => {
                match user.user_principal_name.as_deref().filter(|u| !u.is_empty()) {
                    Some(upn) => upn.to_string(),
                    None => {
                        debug!(login_name = %user.login_name, "Skipping user without a user principal name");
                        return Ok(None);
                    }
                }
            }
            (PrincipalKind::User, PrincipalType::SecurityGroup) => {
                reasonable_id_from_login_name(&user.login_name)
            }
            (PrincipalKind::User, _) => {
                debug!(login_name = %user.login_name, principal_type = %user.principal_type,
                       "Skipping principal of unmapped type");
                return Ok(None);
            }
        };

        let resource = Resource::new(
            ResourceId::new(&self.resource_type, resource_id),
            user.title.clone(),
        )
        .with_email(user.email.clone())
        .with_profile_value("loginName", user.login_name.clone())
        .with_profile_value("isSiteAdmin", user.is_site_admin)
        .with_profile_value(
            "isGuest",
            user.is_email_authentication_guest_user || user.is_share_by_email_guest_user,
        );
        Ok(Some(resource))
    }

    /// Backfills a missing `UserPrincipalName` from the directory.
    ///
    /// Some site user lists omit the field even for federated users; the
    /// record still carries the Entra object ID, which Graph can resolve.
    async fn hydrate_upn(&self, user: &mut SharePointUser) -> ConnectorResult<()> {
        if user.principal_type != PrincipalType::User
            || user
                .user_principal_name
                .as_deref()
                .is_some_and(|upn| !upn.is_empty())
        {
            return Ok(());
        }
        let Some(user_id) = user.user_id.as_ref().filter(|u| !u.name_id.is_empty()) else {
            return Ok(());
        };

        let upn = self
            .graph
            .get_user_principal_name(&user_id.name_id)
            .await
            .map_err(ConnectorError::from)?;
        debug!(login_name = %user.login_name, %upn, "Resolved user principal name via Graph");
        user.user_principal_name = Some(upn);
        Ok(())
    }
}

#[async_trait]
impl ResourceSyncer for UserSyncer {
    fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    /// Lists the addressable principals of the parent site. The same
    /// principal appearing under several sites yields identical resource
    /// IDs, which the access graph deduplicates.
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
        for mut user in users {
            self.hydrate_upn(&mut user).await?;
            if let Some(resource) = self.user_to_resource(&user)? {
                resources.push(resource);
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
