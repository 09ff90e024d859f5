//! Claims-encoded login name resolution.
//!
//! SharePoint identifies every principal by a pipe-delimited claims string
//! naming the originating identity provider and its value, e.g.
//!
//! - `i:0#.f|membership|user@domain` - federated (Entra) user
//! - `c:0o.c|federateddirectoryclaimprovider|<guid>[_o]` - Entra group,
//!   `_o` marking the "Owners" sub-role
//! - `c:0t.c|tenant|<guid-or-keyword>` - tenant-wide principal
//! - `c:0-.f|rolemanager|<keyword>` - built-in role principal
//! - `c:0!.s|windows` - "All Users (Windows)"
//! - `SHAREPOINT\system` - the built-in system account
//!
//! [`classify`] decodes a login name into a closed [`PrincipalKind`] once,
//! so downstream logic never repeats substring tests; [`build_login_name`]
//! is the inverse used on write paths.

use url::Url;

use crate::error::{SharePointError, SharePointResult};

/// The built-in system account; never a grant candidate.
pub const SYSTEM_ACCOUNT: &str = r"SHAREPOINT\system";

const USER_CLAIM: [&str; 2] = ["i:0#.f", "membership"];
const GROUP_CLAIM: [&str; 2] = ["c:0o.c", "federateddirectoryclaimprovider"];
const ROLEMANAGER_CLAIM: &str = "c:0-.f";
const TENANT_CLAIM: &str = "c:0t.c";
const ALL_USERS_WINDOWS_CLAIM: &str = "c:0!.s";

/// Suffix SharePoint appends to an Entra group ID to address its owners.
const OWNERS_SUFFIX: &str = "_o";

/// Decoded identity of a SharePoint principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalKind {
    /// `SHAREPOINT\system`; always filtered.
    System,
    /// Built-in role principal like "Everyone except external users";
    /// filtered unless special groups are explicitly kept.
    RoleManager { value: String },
    /// Entra security group. `id` is canonical: the `_o` owners suffix is
    /// stripped.
    EntraGroup { id: String, is_owners: bool },
    /// Tenant-wide principal like "Global Administrator".
    TenantGroup { id: String },
    /// Anything else; a federated user or a SharePoint-native principal.
    /// The canonical user ID comes from the principal record's
    /// `UserPrincipalName`, not from the login name.
    User,
}

/// Decodes a login name into its [`PrincipalKind`].
///
/// Tests are order-sensitive: a GUID-shaped value carrying a recognized
/// claim prefix must resolve by that prefix, never as a bare UUID.
///
/// # Errors
///
/// [`SharePointError::MalformedLoginName`] when a recognized claims prefix
/// carries fewer than three pipe segments.
pub fn classify(login_name: &str) -> SharePointResult<PrincipalKind> {
    if login_name == SYSTEM_ACCOUNT {
        return Ok(PrincipalKind::System);
    }

    if login_name.contains("|rolemanager|") {
        let value = third_segment(login_name)?;
        return Ok(PrincipalKind::RoleManager {
            value: value.to_string(),
        });
    }

    if login_name.contains(GROUP_CLAIM[1]) {
        let raw = third_segment(login_name)?;
        let id = raw.strip_suffix(OWNERS_SUFFIX).unwrap_or(raw);
        return Ok(PrincipalKind::EntraGroup {
            id: id.to_string(),
            is_owners: raw.len() != id.len(),
        });
    }

    if login_name.contains("|tenant|") {
        let id = third_segment(login_name)?;
        return Ok(PrincipalKind::TenantGroup { id: id.to_string() });
    }

    Ok(PrincipalKind::User)
}

fn third_segment(login_name: &str) -> SharePointResult<&str> {
    let mut segments = login_name.split('|');
    match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(_), Some(value)) => Ok(value),
        _ => Err(SharePointError::MalformedLoginName {
            login_name: login_name.to_string(),
        }),
    }
}

/// Encodes a bare identifier into the full claims login name for a write
/// operation. Values that already carry a complete claim string pass
/// through unchanged.
#[must_use]
pub fn build_login_name(partial: &str) -> String {
    if partial.contains('@') {
        // A user principal name.
        return format!("{}|{}|{partial}", USER_CLAIM[0], USER_CLAIM[1]);
    }
    if partial.starts_with("rolemanager") {
        // A special principal like "Everyone except external users".
        return format!("{ROLEMANAGER_CLAIM}|{partial}");
    }
    if partial.starts_with("tenant") {
        // A tenant-wide principal like "Global Administrator".
        return format!("{TENANT_CLAIM}|{partial}");
    }
    if partial == "windows" {
        // "All Users (Windows)", seen on sites acting as M365 groups.
        return format!("{ALL_USERS_WINDOWS_CLAIM}|{partial}");
    }
    if looks_like_uuid(partial) {
        // A bare Microsoft 365 group object ID.
        return format!("{}|{}|{partial}", GROUP_CLAIM[0], GROUP_CLAIM[1]);
    }

    partial.to_string()
}

/// Whether a value has the five-hyphen-segment shape of a GUID.
pub(crate) fn looks_like_uuid(value: &str) -> bool {
    let mut count = 0;
    for part in value.split('-') {
        if part.is_empty() || part.contains(char::is_whitespace) {
            return false;
        }
        count += 1;
    }
    count == 5
}

/// Derives a locally-addressable ID from a native principal's login name by
/// stripping the claim-type prefix.
///
/// The one exception is `c:0(.s|true`, the "Everyone" principal: its value
/// segment is the bare literal `true`, so the full encoded form is kept as
/// the ID.
#[must_use]
pub fn reasonable_id_from_login_name(login_name: &str) -> String {
    match login_name.split_once('|') {
        Some((_, value)) if value != "true" => value.to_string(),
        _ => login_name.to_string(),
    }
}

/// Walks a SharePoint URL back to its site web root.
///
/// `https://tenant.sharepoint.com/sites/Crisis/_api/Web/SiteGroups/GetById(5)`
/// becomes `https://tenant.sharepoint.com/sites/Crisis`; the cut happens at
/// the first `_`-prefixed segment (`_api`, `_layouts`) or just past
/// `sites/{name}`.
pub fn guess_site_web_url_base(site: &str) -> SharePointResult<String> {
    let mut url = Url::parse(site)?;
    let path = url.path().to_string();
    let parts: Vec<&str> = path.split('/').collect();

    for index in (1..parts.len()).rev() {
        let part = parts[index];
        if part.starts_with('_') {
            url.set_path(&parts[..index].join("/"));
            break;
        }
        if part == "sites" {
            let end = (index + 2).min(parts.len());
            url.set_path(&parts[..end].join("/"));
            break;
        }
    }

    Ok(url.to_string())
}
