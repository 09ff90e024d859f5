//! Connector capability traits.
//!
//! A connector registers one [`ResourceSyncer`] per resource type it syncs.
//! Syncers that can also mutate upstream membership implement
//! [`Provisioner`]. Errors cross this boundary as
//! [`ConnectorError`](crate::error::ConnectorError); connector-specific error
//! types convert at the call site.

use async_trait::async_trait;

use crate::error::ConnectorResult;
use crate::pagination::PageCursor;
use crate::types::{Entitlement, Grant, Resource, ResourceId, ResourceType};

/// Descriptive metadata about a connector instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorMetadata {
    /// Human-readable connector name.
    pub display_name: String,
    /// Short description of what the connector syncs.
    pub description: String,
}

/// Base trait for all connectors.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Metadata about this connector instance.
    fn metadata(&self) -> ConnectorMetadata;

    /// Exercises the configured credentials against the upstream system.
    ///
    /// Returns `Ok(())` if the connector can authenticate and read data.
    async fn validate(&self) -> ConnectorResult<()>;
}

/// Capability for syncing one resource type into the access graph.
#[async_trait]
pub trait ResourceSyncer: Send + Sync {
    /// The resource type this syncer produces.
    fn resource_type(&self) -> &ResourceType;

    /// Lists one page of resources.
    ///
    /// The cursor carries upstream continuation state between calls; the
    /// returned cursor encodes to an empty string when the listing is
    /// complete.
    async fn list(
        &self,
        parent: Option<&ResourceId>,
        cursor: PageCursor,
    ) -> ConnectorResult<(Vec<Resource>, PageCursor)>;

    /// Entitlements exposed by a resource of this type.
    async fn entitlements(&self, resource: &Resource) -> ConnectorResult<Vec<Entitlement>>;

    /// Grants of this resource's entitlements.
    ///
    /// Implementations skip principals that cannot be represented in the
    /// graph rather than failing the whole listing.
    async fn grants(&self, resource: &Resource) -> ConnectorResult<Vec<Grant>>;
}

/// Capability for mutating upstream membership.
#[async_trait]
pub trait Provisioner: ResourceSyncer {
    /// Grants `entitlement` to `principal` in the upstream system.
    async fn grant(&self, entitlement: &Entitlement, principal: &ResourceId)
        -> ConnectorResult<()>;

    /// Revokes a previously observed grant in the upstream system.
    async fn revoke(&self, grant: &Grant) -> ConnectorResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectorError;
    use crate::types::ResourceTrait;

    struct StaticSyncer {
        resource_type: ResourceType,
    }

    #[async_trait]
    impl ResourceSyncer for StaticSyncer {
        fn resource_type(&self) -> &ResourceType {
            &self.resource_type
        }

        async fn list(
            &self,
            _parent: Option<&ResourceId>,
            mut cursor: PageCursor,
        ) -> ConnectorResult<(Vec<Resource>, PageCursor)> {
            cursor.set_next(None);
            let id = ResourceId::new(&self.resource_type, "only");
            Ok((vec![Resource::new(id, "Only")], cursor))
        }

        async fn entitlements(&self, resource: &Resource) -> ConnectorResult<Vec<Entitlement>> {
            Ok(vec![Entitlement::assignment(resource, "member")])
        }

        async fn grants(&self, _resource: &Resource) -> ConnectorResult<Vec<Grant>> {
            Err(ConnectorError::NotSupported {
                operation: "grants".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_syncer_contract() {
        let syncer = StaticSyncer {
            resource_type: ResourceType::group("thing", "Thing"),
        };
        assert_eq!(syncer.resource_type().resource_trait, ResourceTrait::Group);

        let (resources, cursor) = syncer.list(None, PageCursor::default()).await.unwrap();
        assert_eq!(resources.len(), 1);
        assert!(cursor.is_done());

        let ents = syncer.entitlements(&resources[0]).await.unwrap();
        assert_eq!(ents[0].slug, "member");
    }
}
