//! # Castellan Connector Framework
//!
//! Core abstractions for synchronizing external identity systems into the
//! castellan access graph.
//!
//! A connector observes an upstream system and produces a normalized model:
//!
//! - [`types::Resource`] - a typed node (site, group, user, ...) with a
//!   stable external ID and an optional parent link
//! - [`types::Entitlement`] - a named capability exposed by a resource
//!   (e.g. "member", "admin")
//! - [`types::Grant`] - an assignment of an entitlement to a principal
//!   resource, optionally annotated with a cross-reference for downstream
//!   identity reconciliation
//!
//! Connectors implement the capability traits in [`traits`] per resource
//! type, and drive paginated listings through the [`pagination::PageCursor`]
//! abstraction.
//!
//! ## Crate Organization
//!
//! - [`types`] - Resource / Entitlement / Grant model
//! - [`traits`] - Connector and resource syncer capability traits
//! - [`pagination`] - Opaque page cursor for list operations
//! - [`error`] - Framework error types

pub mod error;
pub mod pagination;
pub mod traits;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```
/// use castellan_connector::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ConnectorError, ConnectorResult};
    pub use crate::pagination::PageCursor;
    pub use crate::traits::{Connector, ConnectorMetadata, Provisioner, ResourceSyncer};
    pub use crate::types::{
        CrossReference, Entitlement, Grant, Resource, ResourceId, ResourceTrait, ResourceType,
    };
}

// Re-export async_trait for connector implementors
pub use async_trait::async_trait;
