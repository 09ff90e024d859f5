//! SharePoint Online Connector for castellan
//!
//! This crate implements the castellan-connector traits for SharePoint
//! Online and Microsoft 365, syncing sites, site groups, users, and
//! security principals into the access graph.
//!
//! # Features
//!
//! - `OAuth2` client credentials authentication against Microsoft Graph
//! - Certificate-assertion (JWT bearer) authentication for the SharePoint
//!   REST API, with per-audience token caching
//! - Claims-encoded login name resolution for Entra users and groups,
//!   tenant principals, and SharePoint-native security principals
//! - Group membership provisioning (add and remove)
//! - Per-site form digest caching for write calls
//!
//! # Example
//!
//! ```no_run
//! use castellan_connector::traits::Connector;
//! use castellan_connector_sharepoint::{
//!     SharePointConfig, SharePointConnector, SharePointCredentials,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SharePointConfig::builder()
//!     .tenant_id("your-tenant-id")
//!     .sharepoint_domain("contoso")
//!     .build()?;
//!
//! let credentials = SharePointCredentials {
//!     client_id: "your-client-id".to_string(),
//!     client_secret: "your-client-secret".to_string().into(),
//!     pfx_certificate: "base64-encoded .pfx bundle".to_string(),
//!     pfx_password: "bundle password".to_string().into(),
//! };
//!
//! let connector = SharePointConnector::new(config, credentials);
//! connector.validate().await?;
//! # Ok(())
//! # }
//! ```

mod assertion;
mod auth;
mod config;
mod connector;
mod digest;
mod error;
mod explain;
mod grants;
mod graph_client;
mod groups;
mod login_name;
mod model;
mod rest_client;
mod security_principals;
mod sites;
mod users;

// Re-exports
pub use auth::{GraphTokenCache, SharePointTokenCache};
pub use config::{SharePointConfig, SharePointConfigBuilder, SharePointCredentials};
pub use connector::SharePointConnector;
pub use digest::FormDigestCache;
pub use error::{SharePointError, SharePointResult};
pub use explain::{explain_body, ExplainedError};
pub use grants::{entitlement_slug_from_title, map_principal_to_grant};
pub use graph_client::{GraphClient, SitePage};
pub use groups::GroupSyncer;
pub use login_name::{
    build_login_name, classify, guess_site_web_url_base, reasonable_id_from_login_name,
    PrincipalKind,
};
pub use model::{
    ContextInfo, PrincipalType, SharePointUser, Site, SiteCollection, SiteGroup, UserIdInfo,
};
pub use rest_client::SharePointRestClient;
pub use security_principals::SecurityPrincipalSyncer;
pub use sites::SiteSyncer;
pub use users::UserSyncer;
