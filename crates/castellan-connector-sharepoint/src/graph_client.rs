//! Microsoft Graph client for site discovery and user lookups.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::auth::GraphTokenCache;
use crate::config::SharePointConfig;
use crate::error::{SharePointError, SharePointResult};
use crate::explain::{explain_body, membership_permission_hint};
use crate::model::{GraphCollection, Site};

/// Fields requested for every site record.
const SITE_SELECT: &str = "id,name,displayName,isPersonalSite,webUrl,siteCollection";

/// One page of a Graph site listing.
#[derive(Debug)]
pub struct SitePage {
    pub sites: Vec<Site>,
    /// Absolute URL of the next page, if any.
    pub next_link: Option<String>,
}

/// Thin client over the Graph `sites` and `users` endpoints.
#[derive(Debug, Clone)]
pub struct GraphClient {
    config: Arc<SharePointConfig>,
    tokens: GraphTokenCache,
    http_client: reqwest::Client,
}

impl GraphClient {
    /// Creates a new Graph client.
    pub fn new(
        config: Arc<SharePointConfig>,
        tokens: GraphTokenCache,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            config,
            tokens,
            http_client,
        }
    }

    /// Lists one page of site collections and subsites.
    ///
    /// `next_link` continues a previous page; the first page issues an
    /// empty `search` query, which is how Graph enumerates every site in
    /// the tenant. That query shape requires the `ConsistencyLevel:
    /// eventual` header.
    #[instrument(skip(self))]
    pub async fn list_sites(&self, next_link: Option<&str>) -> SharePointResult<SitePage> {
        let request = match next_link {
            Some(link) => self.http_client.get(link),
            None => self
                .http_client
                .get(format!("{}/sites", self.config.graph_base_url()))
                .query(&[
                    ("search", ""),
                    ("$select", SITE_SELECT),
                    ("$top", &self.config.page_size.to_string()),
                ]),
        };

        let page: GraphCollection<Site> = self.get_json(request).await?;
        debug!(count = page.value.len(), "Listed sites page");
        Ok(SitePage {
            sites: page.value,
            next_link: page.next_link,
        })
    }

    /// Fetches a single site by its Graph composite ID.
    #[instrument(skip(self))]
    pub async fn get_site_by_id(&self, site_id: &str) -> SharePointResult<Site> {
        let request = self
            .http_client
            .get(format!(
                "{}/sites/{}",
                self.config.graph_base_url(),
                urlencoding::encode(site_id)
            ))
            .query(&[("$select", SITE_SELECT)]);
        self.get_json(request).await
    }

    /// Resolves an Entra user object ID to its user principal name.
    #[instrument(skip(self))]
    pub async fn get_user_principal_name(&self, user_id: &str) -> SharePointResult<String> {
        #[derive(Debug, serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct UpnOnly {
            user_principal_name: String,
        }

        let request = self
            .http_client
            .get(format!(
                "{}/users/{}",
                self.config.graph_base_url(),
                urlencoding::encode(user_id)
            ))
            .query(&[("$select", "userPrincipalName")]);
        let user: UpnOnly = self.get_json(request).await?;
        Ok(user.user_principal_name)
    }

    /// Sends a request with auth headers and decodes the JSON response.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> SharePointResult<T> {
        let token = self.tokens.get_token().await?;
        let response = request
            .bearer_auth(token)
            .header("ConsistencyLevel", "eventual")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::FORBIDDEN {
                return Err(SharePointError::PermissionDenied {
                    message: membership_permission_hint(),
                });
            }
            let message = explain_body(&body).unwrap_or(body);
            return Err(SharePointError::Api {
                message: format!("Graph request failed with status {status}: {message}"),
            });
        }

        Ok(response.json().await?)
    }
}
