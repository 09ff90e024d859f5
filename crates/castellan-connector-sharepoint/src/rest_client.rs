//! SharePoint REST client for site-scoped groups and users.
//!
//! Unlike Graph, these endpoints are scoped to a site web: every call
//! takes the site's web URL base and appends `_api/...`. Reads carry a
//! bearer token only; writes additionally need a form digest in
//! `X-RequestDigest`.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::auth::SharePointTokenCache;
use crate::digest::FormDigestCache;
use crate::error::{SharePointError, SharePointResult};
use crate::explain::membership_permission_hint;
use crate::model::{AddUserRequest, SharePointCollection, SharePointUser, SiteGroup};

/// Thin client over the site-scoped SharePoint REST API.
#[derive(Debug, Clone)]
pub struct SharePointRestClient {
    tokens: SharePointTokenCache,
    digests: Arc<FormDigestCache>,
    http_client: reqwest::Client,
}

impl SharePointRestClient {
    /// Creates a new REST client.
    pub fn new(
        tokens: SharePointTokenCache,
        digests: Arc<FormDigestCache>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            tokens,
            digests,
            http_client,
        }
    }

    /// Lists the SharePoint-native groups of a site.
    #[instrument(skip(self))]
    pub async fn list_site_groups(&self, web_url: &str) -> SharePointResult<Vec<SiteGroup>> {
        let groups: SharePointCollection<SiteGroup> = self
            .get_json(&format!("{web_url}/_api/web/sitegroups"))
            .await?;
        debug!(count = groups.value.len(), "Listed site groups");
        Ok(groups.value)
    }

    /// Lists the members of one site group.
    #[instrument(skip(self))]
    pub async fn list_users_in_group(
        &self,
        web_url: &str,
        group_id: i64,
    ) -> SharePointResult<Vec<SharePointUser>> {
        let users: SharePointCollection<SharePointUser> = self
            .get_json(&format!("{web_url}/_api/web/sitegroups({group_id})/users"))
            .await?;
        Ok(users.value)
    }

    /// Lists every principal known to a site, groups and claims
    /// principals included.
    #[instrument(skip(self))]
    pub async fn list_site_users(&self, web_url: &str) -> SharePointResult<Vec<SharePointUser>> {
        let users: SharePointCollection<SharePointUser> = self
            .get_json(&format!("{web_url}/_api/web/siteusers"))
            .await?;
        debug!(count = users.value.len(), "Listed site users");
        Ok(users.value)
    }

    /// Adds a principal to a site group by claims login name.
    ///
    /// SharePoint resolves the login name against the directory, so the
    /// principal does not need to exist in the site's user list yet.
    #[instrument(skip(self))]
    pub async fn add_user_to_group(
        &self,
        web_url: &str,
        group_id: i64,
        login_name: &str,
    ) -> SharePointResult<()> {
        let digest = self.digests.get_digest(web_url).await?;
        let token = self.tokens.get_token().await?;

        let response = self
            .http_client
            .post(format!("{web_url}/_api/web/sitegroups({group_id})/users"))
            .bearer_auth(token)
            .header("Accept", "application/json;odata=verbose")
            .header("Content-Type", "application/json;odata=verbose")
            .header("X-RequestDigest", digest)
            .json(&AddUserRequest::new(login_name))
            .send()
            .await?;

        self.check_write_response(response, "add user to group").await
    }

    /// Removes a principal from a site group by its site-local user ID.
    #[instrument(skip(self))]
    pub async fn remove_user_from_group(
        &self,
        web_url: &str,
        group_id: i64,
        user_id: i64,
    ) -> SharePointResult<()> {
        let digest = self.digests.get_digest(web_url).await?;
        let token = self.tokens.get_token().await?;

        let response = self
            .http_client
            .post(format!(
                "{web_url}/_api/web/sitegroups({group_id})/users/removebyid({user_id})"
            ))
            .bearer_auth(token)
            .header("Accept", "application/json;odata=verbose")
            .header("X-RequestDigest", digest)
            .header("X-HTTP-Method", "Delete")
            .send()
            .await?;

        self.check_write_response(response, "remove user from group")
            .await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> SharePointResult<T> {
        let token = self.tokens.get_token().await?;
        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .header("Accept", "application/json;odata=minimalmetadata")
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
            return Err(SharePointError::Api {
                message: format!("SharePoint request failed with status {status}: {body}"),
            });
        }

        Ok(response.json().await?)
    }

    async fn check_write_response(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> SharePointResult<()> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::FORBIDDEN {
                return Err(SharePointError::PermissionDenied {
                    message: format!("{operation} was denied; {}", membership_permission_hint()),
                });
            }
            return Err(SharePointError::Api {
                message: format!("{operation} failed with status {status}: {body}"),
            });
        }
        Ok(())
    }
}
