//! OAuth2 token acquisition and caching.
//!
//! The connector holds two independent bearer tokens from the same app
//! registration: Microsoft Graph accepts the client secret, while the
//! SharePoint REST API only accepts a certificate-signed JWT assertion.
//! Each flow gets its own cache so the audiences never mix.

use chrono::{DateTime, Duration, Utc};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::assertion::{self, AssertionOptions};
use crate::config::{SharePointConfig, SharePointCredentials};
use crate::error::{SharePointError, SharePointResult};
use crate::explain::explain_body;

/// OAuth2 token response from the login endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Cached OAuth2 access token.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Returns true if the token is expired or will expire within the
    /// grace period. With a zero grace period the token is reused up to
    /// the instant before `expires_at` and refreshed from `expires_at` on.
    fn is_expired(&self, grace_period: Duration) -> bool {
        Utc::now() + grace_period >= self.expires_at
    }
}

/// Token cache for the Graph client-credentials flow.
#[derive(Debug, Clone)]
pub struct GraphTokenCache {
    config: Arc<SharePointConfig>,
    credentials: Arc<SharePointCredentials>,
    http_client: reqwest::Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    /// Optional early-refresh window before expiry; zero by default, so a
    /// token is reused for its full lifetime.
    grace_period: Duration,
}

impl GraphTokenCache {
    /// Creates a new Graph token cache.
    pub fn new(
        config: Arc<SharePointConfig>,
        credentials: Arc<SharePointCredentials>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            config,
            credentials,
            http_client,
            cached_token: Arc::new(RwLock::new(None)),
            grace_period: Duration::zero(),
        }
    }

    /// Gets a valid Graph access token, refreshing if necessary.
    #[instrument(skip(self), fields(tenant_id = %self.config.tenant_id))]
    pub async fn get_token(&self) -> SharePointResult<String> {
        {
            let cache = self.cached_token.read().await;
            if let Some(ref token) = *cache {
                if !token.is_expired(self.grace_period) {
                    debug!("Using cached Graph token");
                    return Ok(token.access_token.clone());
                }
            }
        }

        debug!("Refreshing Graph access token");
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            (
                "client_secret",
                self.credentials.client_secret.expose_secret(),
            ),
            ("scope", &self.config.graph_scope()),
        ];
        let response =
            exchange(&self.http_client, &self.config.token_endpoint(), &params).await?;

        let new_token = CachedToken {
            access_token: response.access_token,
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
        };

        {
            let mut cache = self.cached_token.write().await;
            *cache = Some(new_token.clone());
        }

        Ok(new_token.access_token)
    }

    /// Seeds the cache with a known token.
    pub async fn prime(&self, access_token: impl Into<String>, expires_at: DateTime<Utc>) {
        let mut cache = self.cached_token.write().await;
        *cache = Some(CachedToken {
            access_token: access_token.into(),
            expires_at,
        });
    }

    /// Invalidates the cached token, forcing a refresh on next use.
    pub async fn invalidate(&self) {
        let mut cache = self.cached_token.write().await;
        *cache = None;
    }
}

/// Token cache for the SharePoint REST certificate-assertion flow.
#[derive(Debug, Clone)]
pub struct SharePointTokenCache {
    config: Arc<SharePointConfig>,
    credentials: Arc<SharePointCredentials>,
    http_client: reqwest::Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    grace_period: Duration,
}

impl SharePointTokenCache {
    /// Creates a new SharePoint token cache.
    pub fn new(
        config: Arc<SharePointConfig>,
        credentials: Arc<SharePointCredentials>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            config,
            credentials,
            http_client,
            cached_token: Arc::new(RwLock::new(None)),
            grace_period: Duration::zero(),
        }
    }

    /// Gets a valid SharePoint access token, signing a fresh assertion and
    /// exchanging it if the cached token is stale.
    #[instrument(skip(self), fields(tenant_id = %self.config.tenant_id))]
    pub async fn get_token(&self) -> SharePointResult<String> {
        {
            let cache = self.cached_token.read().await;
            if let Some(ref token) = *cache {
                if !token.is_expired(self.grace_period) {
                    debug!("Using cached SharePoint token");
                    return Ok(token.access_token.clone());
                }
            }
        }

        debug!("Refreshing SharePoint access token");
        let now = Utc::now();
        let assertion = assertion::sign_assertion(
            &self.credentials.pfx_certificate,
            self.credentials.pfx_password.expose_secret(),
            &AssertionOptions {
                client_id: self.credentials.client_id.clone(),
                tenant_id: self.config.tenant_id.clone(),
                now,
                validity: self.config.assertion_validity,
                not_before: self.config.assertion_not_before,
            },
        )?;

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            (
                "client_assertion_type",
                "urn:ietf:params:oauth:client-assertion-type:jwt-bearer",
            ),
            ("client_assertion", &assertion),
            ("scope", &self.config.sharepoint_scope()),
        ];
        let response =
            exchange(&self.http_client, &self.config.token_endpoint(), &params).await?;

        // The token is never useful past the assertion it was minted from.
        let new_token = CachedToken {
            access_token: response.access_token,
            expires_at: now + self.config.assertion_validity,
        };

        {
            let mut cache = self.cached_token.write().await;
            *cache = Some(new_token.clone());
        }

        Ok(new_token.access_token)
    }

    /// Seeds the cache with a known token.
    pub async fn prime(&self, access_token: impl Into<String>, expires_at: DateTime<Utc>) {
        let mut cache = self.cached_token.write().await;
        *cache = Some(CachedToken {
            access_token: access_token.into(),
            expires_at,
        });
    }

    /// Invalidates the cached token, forcing a refresh on next use.
    pub async fn invalidate(&self) {
        let mut cache = self.cached_token.write().await;
        *cache = None;
    }
}

/// Posts the form to the token endpoint and parses the response.
///
/// Transport failures surface as [`SharePointError::Http`];
/// [`SharePointError::TokenExchange`] is reserved for responses the
/// endpoint did answer but that carry no usable token.
async fn exchange(
    http_client: &reqwest::Client,
    token_endpoint: &str,
    params: &[(&str, &str)],
) -> SharePointResult<TokenResponse> {
    let response = http_client.post(token_endpoint).form(params).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = explain_body(&body).unwrap_or(body);
        return Err(SharePointError::TokenExchange(format!(
            "token request failed with status {status}: {message}"
        )));
    }

    let token_response: TokenResponse = response.json().await.map_err(|e| {
        SharePointError::TokenExchange(format!("failed to parse token response: {e}"))
    })?;

    if token_response.access_token.is_empty() {
        return Err(SharePointError::TokenExchange(
            "token endpoint returned an empty access token".to_string(),
        ));
    }

    Ok(token_response)
}
