//! Mapping SharePoint principals to access-graph grants.
//!
//! SharePoint reports group and site membership as `SP.User` principal
//! records whose login names encode the originating provider. The mapper
//! resolves each record to a grant against the right principal resource,
//! or to nothing at all for principals that carry no governance signal.

use castellan_connector::types::{CrossReference, Grant, Resource, ResourceId, ResourceTrait};
use tracing::debug;

use crate::error::{SharePointError, SharePointResult};
use crate::login_name::{classify, reasonable_id_from_login_name, PrincipalKind};
use crate::model::{PrincipalType, SharePointUser};

/// Resource type ID for user principals, shared with the directory
/// connector so grants line up across sources.
pub(crate) const USER_TYPE_ID: &str = "user";

/// Resource type ID for group principals.
pub(crate) const GROUP_TYPE_ID: &str = "group";

/// Resolves a principal record into a grant of `entitlement` on
/// `resource`.
///
/// Returns `Ok(None)` for principals that are deliberately skipped: the
/// system account always, and rolemanager claims principals unless
/// `keep_special_groups` is set.
///
/// # Errors
///
/// [`SharePointError::UnrecognizedPrincipal`] when the record matches no
/// mapping rule; callers log and skip these rather than fail the sync.
pub fn map_principal_to_grant(
    resource: &Resource,
    entitlement: &str,
    principal: &SharePointUser,
    keep_special_groups: bool,
) -> SharePointResult<Option<Grant>> {
    match classify(&principal.login_name)? {
        PrincipalKind::System => {
            debug!(login_name = %principal.login_name, "Skipping system account");
            Ok(None)
        }
        PrincipalKind::RoleManager { .. } => {
            if !keep_special_groups {
                debug!(login_name = %principal.login_name, "Filtering rolemanager principal");
                return Ok(None);
            }
            let id = reasonable_id_from_login_name(&principal.login_name);
            Ok(Some(Grant::new(
                resource,
                entitlement,
                ResourceId::external(USER_TYPE_ID, id),
            )))
        }
        PrincipalKind::EntraGroup { id, .. } => Ok(Some(
            Grant::new(
                resource,
                entitlement,
                ResourceId::external(GROUP_TYPE_ID, id.clone()),
            )
            .with_cross_reference(CrossReference::ExternalId { id }),
        )),
        PrincipalKind::TenantGroup { id } => Ok(Some(
            Grant::new(
                resource,
                entitlement,
                ResourceId::external(GROUP_TYPE_ID, id),
            )
            .with_cross_reference(CrossReference::Field {
                key: "loginName".to_string(),
                value: principal.login_name.clone(),
                resource_trait: ResourceTrait::Group,
            }),
        )),
        PrincipalKind::User => match principal.principal_type {
            PrincipalType::User => {
                let upn = principal
                    .user_principal_name
                    .as_deref()
                    .filter(|u| !u.is_empty())
                    .ok_or_else(|| SharePointError::UnrecognizedPrincipal {
                        login_name: principal.login_name.clone(),
                        principal_type: principal.principal_type,
                    })?;
                Ok(Some(
                    Grant::new(
                        resource,
                        entitlement,
                        ResourceId::external(USER_TYPE_ID, upn),
                    )
                    .with_cross_reference(CrossReference::Field {
                        key: "userPrincipalName".to_string(),
                        value: upn.to_string(),
                        resource_trait: ResourceTrait::User,
                    }),
                ))
            }
            // SharePoint-native security principals live in this
            // connector's own namespace, addressed by their stripped ID.
            PrincipalType::SecurityGroup => {
                let id = reasonable_id_from_login_name(&principal.login_name);
                Ok(Some(Grant::new(
                    resource,
                    entitlement,
                    ResourceId::external(USER_TYPE_ID, id),
                )))
            }
            other => Err(SharePointError::UnrecognizedPrincipal {
                login_name: principal.login_name.clone(),
                principal_type: other,
            }),
        },
    }
}

/// Derives the membership entitlement slug from a SharePoint group title:
/// the last word, lowercased and singularized ("Crisis Members" becomes
/// "member").
#[must_use]
pub fn entitlement_slug_from_title(title: &str) -> String {
    let lower = title.to_lowercase();
    let last = lower.split(' ').next_back().unwrap_or("");
    last.strip_suffix('s').unwrap_or(last).to_string()
}
