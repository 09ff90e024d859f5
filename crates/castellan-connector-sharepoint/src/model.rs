//! Wire types for the Microsoft Graph and SharePoint REST APIs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Principal type reported by SharePoint for users and groups.
///
/// SharePoint models this as a bitwise `SP.PrincipalType`; in practice the
/// REST API reports one of the named values per principal. Unrecognized
/// combinations are preserved in [`PrincipalType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum PrincipalType {
    /// No principal type.
    None,
    /// A user.
    User,
    /// A distribution list.
    DistributionList,
    /// A security group.
    SecurityGroup,
    /// A SharePoint-native group.
    SharePointGroup,
    /// All principal types.
    All,
    /// An unmapped bitwise combination.
    Other(i32),
}

impl Default for PrincipalType {
    fn default() -> Self {
        PrincipalType::None
    }
}

impl From<i32> for PrincipalType {
    fn from(value: i32) -> Self {
        match value {
            0 => PrincipalType::None,
            1 => PrincipalType::User,
            2 => PrincipalType::DistributionList,
            4 => PrincipalType::SecurityGroup,
            8 => PrincipalType::SharePointGroup,
            15 => PrincipalType::All,
            other => PrincipalType::Other(other),
        }
    }
}

impl From<PrincipalType> for i32 {
    fn from(value: PrincipalType) -> Self {
        match value {
            PrincipalType::None => 0,
            PrincipalType::User => 1,
            PrincipalType::DistributionList => 2,
            PrincipalType::SecurityGroup => 4,
            PrincipalType::SharePointGroup => 8,
            PrincipalType::All => 15,
            PrincipalType::Other(other) => other,
        }
    }
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrincipalType::None => write!(f, "None"),
            PrincipalType::User => write!(f, "User"),
            PrincipalType::DistributionList => write!(f, "Distribution List"),
            PrincipalType::SecurityGroup => write!(f, "Security Group"),
            PrincipalType::SharePointGroup => write!(f, "SharePoint Group"),
            PrincipalType::All => write!(f, "All"),
            PrincipalType::Other(value) => write!(f, "Other({value})"),
        }
    }
}

/// A site from the Graph `sites` listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Site {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub is_personal_site: bool,
    pub web_url: String,
    pub site_collection: Option<SiteCollection>,
}

/// Site-collection facet, present on root sites only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteCollection {
    pub hostname: String,
    pub data_location_code: Option<String>,
}

/// A SharePoint-native group (`SP.Group`) scoped to one site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteGroup {
    /// OData resource URL; doubles as the group's addressable ID
    /// (`.../_api/Web/SiteGroups/GetById(N)`).
    #[serde(rename = "odata.id")]
    pub odata_id: String,
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "LoginName")]
    pub login_name: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "OwnerTitle")]
    pub owner_title: String,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "OnlyAllowMembersViewMembership")]
    pub only_allow_members_view_membership: bool,
    #[serde(rename = "PrincipalType")]
    pub principal_type: PrincipalType,
}

/// A SharePoint principal (`SP.User`): a user, security group, or claims
/// principal as reported per site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SharePointUser {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "LoginName")]
    pub login_name: String,
    #[serde(rename = "UserPrincipalName")]
    pub user_principal_name: Option<String>,
    #[serde(rename = "IsSiteAdmin")]
    pub is_site_admin: bool,
    #[serde(rename = "IsHiddenInUI")]
    pub is_hidden_in_ui: bool,
    #[serde(rename = "PrincipalType")]
    pub principal_type: PrincipalType,
    #[serde(rename = "IsEmailAuthenticationGuestUser")]
    pub is_email_authentication_guest_user: bool,
    #[serde(rename = "IsShareByEmailGuestUser")]
    pub is_share_by_email_guest_user: bool,
    #[serde(rename = "UserId")]
    pub user_id: Option<UserIdInfo>,
}

/// Directory identity of a site principal; `name_id` is the Entra object
/// ID for federated users.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserIdInfo {
    #[serde(rename = "NameId")]
    pub name_id: String,
    #[serde(rename = "NameIdIssuer")]
    pub name_id_issuer: String,
}

/// Envelope for SharePoint REST collection responses.
#[derive(Debug, Deserialize)]
pub struct SharePointCollection<T> {
    pub value: Vec<T>,
}

/// Envelope for paginated Graph collection responses.
#[derive(Debug, Deserialize)]
pub struct GraphCollection<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Response of `_api/contextinfo`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContextInfo {
    #[serde(rename = "FormDigestTimeoutSeconds")]
    pub form_digest_timeout_seconds: i64,
    #[serde(rename = "FormDigestValue")]
    pub form_digest_value: String,
    #[serde(rename = "WebFullUrl")]
    pub web_full_url: String,
    #[serde(rename = "SiteFullUrl")]
    pub site_full_url: String,
}

/// Body of the `sitegroups(N)/users` membership POST.
#[derive(Debug, Serialize)]
pub struct AddUserRequest {
    #[serde(rename = "__metadata")]
    pub metadata: AddUserMetadata,
    #[serde(rename = "LoginName")]
    pub login_name: String,
}

#[derive(Debug, Serialize)]
pub struct AddUserMetadata {
    #[serde(rename = "type")]
    pub type_name: String,
}

impl AddUserRequest {
    /// Builds the verbose-OData body SharePoint expects for membership
    /// writes.
    pub fn new(login_name: impl Into<String>) -> Self {
        Self {
            metadata: AddUserMetadata {
                type_name: "SP.User".to_string(),
            },
            login_name: login_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_type_roundtrip() {
        for raw in [0, 1, 2, 4, 8, 15] {
            let pt = PrincipalType::from(raw);
            assert_eq!(i32::from(pt), raw);
        }
        assert_eq!(PrincipalType::from(6), PrincipalType::Other(6));
    }

    #[test]
    fn test_sharepoint_user_parses_rest_shape() {
        let json = r#"{
            "odata.type": "SP.User",
            "Id": 12,
            "Title": "Jane Doe",
            "Email": "jane@example.com",
            "LoginName": "i:0#.f|membership|jane@example.com",
            "UserPrincipalName": "jane@example.com",
            "IsSiteAdmin": true,
            "IsHiddenInUI": false,
            "PrincipalType": 1,
            "UserId": {
                "NameId": "10032001a4b5c6d7",
                "NameIdIssuer": "urn:federation:microsoftonline"
            }
        }"#;

        let user: SharePointUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 12);
        assert_eq!(user.principal_type, PrincipalType::User);
        assert!(user.is_site_admin);
        assert_eq!(user.user_principal_name.as_deref(), Some("jane@example.com"));
        assert_eq!(user.user_id.unwrap().name_id, "10032001a4b5c6d7");
    }

    #[test]
    fn test_site_group_parses_odata_id() {
        let json = r#"{
            "odata.id": "https://tenant.sharepoint.com/sites/Crisis/_api/Web/SiteGroups/GetById(5)",
            "Id": 5,
            "LoginName": "Crisis Members",
            "Title": "Crisis Members",
            "OwnerTitle": "System Account",
            "PrincipalType": 8
        }"#;

        let group: SiteGroup = serde_json::from_str(json).unwrap();
        assert_eq!(group.id, 5);
        assert_eq!(group.principal_type, PrincipalType::SharePointGroup);
        assert!(group.odata_id.ends_with("GetById(5)"));
    }

    #[test]
    fn test_graph_collection_next_link() {
        #[derive(Debug, Deserialize)]
        struct Item {
            #[allow(dead_code)]
            id: String,
        }

        let json = r#"{
            "value": [{"id": "1"}],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/sites?$skiptoken=x"
        }"#;
        let page: GraphCollection<Item> = serde_json::from_str(json).unwrap();
        assert_eq!(page.value.len(), 1);
        assert!(page.next_link.is_some());
    }

    #[test]
    fn test_add_user_request_body() {
        let body = AddUserRequest::new("i:0#.f|membership|a@b.com");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["__metadata"]["type"], "SP.User");
        assert_eq!(json["LoginName"], "i:0#.f|membership|a@b.com");
    }
}
