//! Access-graph model types.
//!
//! Resources, entitlements, and grants are the normalized output of every
//! connector sync pass. They are plain serializable records; the framework
//! attaches no behavior beyond construction helpers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Governance trait carried by a resource type.
///
/// Determines how the downstream reconciliation engine treats principals of
/// this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceTrait {
    /// The resource represents a person.
    User,
    /// The resource represents a collection of principals.
    Group,
}

impl fmt::Display for ResourceTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceTrait::User => write!(f, "user"),
            ResourceTrait::Group => write!(f, "group"),
        }
    }
}

/// A resource type registered by a connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceType {
    /// Stable type identifier (e.g. "site", "group", "user").
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Governance trait for resources of this type.
    pub resource_trait: ResourceTrait,
}

impl ResourceType {
    /// Creates a user-trait resource type.
    pub fn user(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            resource_trait: ResourceTrait::User,
        }
    }

    /// Creates a group-trait resource type.
    pub fn group(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            resource_trait: ResourceTrait::Group,
        }
    }
}

/// Fully-qualified identifier of a resource: type plus external ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    /// The resource type identifier.
    pub resource_type: String,
    /// The external identifier within that type.
    pub resource: String,
}

impl ResourceId {
    /// Creates a resource ID for the given type.
    pub fn new(resource_type: &ResourceType, resource: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.id.clone(),
            resource: resource.into(),
        }
    }

    /// Creates a resource ID from a raw type identifier.
    ///
    /// Used for principals whose type is owned by another connector (e.g. an
    /// Entra "user" or "group" referenced from a grant).
    pub fn external(resource_type: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource: resource.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.resource)
    }
}

/// A typed node in the access graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Fully-qualified identifier.
    pub id: ResourceId,
    /// Human-readable name.
    pub display_name: String,
    /// Optional link to the resource this one belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ResourceId>,
    /// Free-form descriptive attributes.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub profile: serde_json::Map<String, serde_json::Value>,
    /// Primary email, for user-trait resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Resource {
    /// Creates a resource with an empty profile.
    pub fn new(id: ResourceId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            parent_id: None,
            profile: serde_json::Map::new(),
            email: None,
        }
    }

    /// Sets the parent resource link.
    #[must_use]
    pub fn with_parent(mut self, parent: ResourceId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Adds a profile attribute.
    #[must_use]
    pub fn with_profile_value(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.profile.insert(key.into(), value.into());
        self
    }

    /// Sets the primary email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into();
        if !email.is_empty() {
            self.email = Some(email);
        }
        self
    }
}

/// A named capability exposed by a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    /// The resource exposing the capability.
    pub resource_id: ResourceId,
    /// Stable capability identifier (e.g. "member", "admin").
    pub slug: String,
    /// Human-readable name.
    pub display_name: String,
    /// Resource type identifiers this entitlement can be granted to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grantable_to: Vec<String>,
}

impl Entitlement {
    /// Creates a membership-style entitlement on a resource.
    pub fn assignment(resource: &Resource, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            resource_id: resource.id.clone(),
            display_name: format!("Membership to {}", resource.display_name),
            slug,
            grantable_to: Vec::new(),
        }
    }

    /// Creates a permission-style entitlement on a resource.
    pub fn permission(resource: &Resource, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            resource_id: resource.id.clone(),
            display_name: format!("{} of {}", capitalize(&slug), resource.display_name),
            slug,
            grantable_to: Vec::new(),
        }
    }

    /// Overrides the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Restricts the resource types this entitlement can be granted to.
    #[must_use]
    pub fn grantable_to(mut self, resource_type: &ResourceType) -> Self {
        self.grantable_to.push(resource_type.id.clone());
        self
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Identity reconciliation hint attached to a grant.
///
/// Tells the downstream matcher which external field identifies the granted
/// principal when the principal resource is owned by another connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CrossReference {
    /// Match by an opaque external object ID.
    ExternalId { id: String },
    /// Match by a named field/value pair on resources of the given trait.
    Field {
        key: String,
        value: String,
        resource_trait: ResourceTrait,
    },
}

/// An assignment of an entitlement to a principal resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    /// The resource whose entitlement is granted.
    pub resource_id: ResourceId,
    /// The entitlement slug on that resource.
    pub entitlement: String,
    /// The principal receiving the grant.
    pub principal: ResourceId,
    /// Optional reconciliation hint for external principals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_reference: Option<CrossReference>,
}

impl Grant {
    /// Creates a grant of `entitlement` on `resource` to `principal`.
    pub fn new(resource: &Resource, entitlement: impl Into<String>, principal: ResourceId) -> Self {
        Self {
            resource_id: resource.id.clone(),
            entitlement: entitlement.into(),
            principal,
            cross_reference: None,
        }
    }

    /// Attaches a cross-reference annotation.
    #[must_use]
    pub fn with_cross_reference(mut self, xref: CrossReference) -> Self {
        self.cross_reference = Some(xref);
        self
    }
}
