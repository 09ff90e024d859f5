//! Form digest acquisition and caching for SharePoint write calls.
//!
//! Every mutating REST call must carry an `X-RequestDigest` header scoped
//! to the site web it targets. Digests are minted by `_api/contextinfo`
//! and expire server-side, so they are cached per site web URL until the
//! expiry encoded in the digest itself.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::auth::SharePointTokenCache;
use crate::error::{SharePointError, SharePointResult};
use crate::model::ContextInfo;

/// Timestamp layout inside a `FormDigestValue`, e.g.
/// `14 Jun 2024 10:00:00 -0000`.
const DIGEST_TIMESTAMP_FORMAT: &str = "%d %b %Y %H:%M:%S %z";

#[derive(Debug, Clone)]
struct CachedDigest {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Per-site cache of form digests.
#[derive(Debug, Clone)]
pub struct FormDigestCache {
    token_cache: SharePointTokenCache,
    http_client: reqwest::Client,
    digests: Arc<RwLock<HashMap<String, CachedDigest>>>,
}

impl FormDigestCache {
    /// Creates a new form digest cache.
    pub fn new(token_cache: SharePointTokenCache, http_client: reqwest::Client) -> Self {
        Self {
            token_cache,
            http_client,
            digests: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Gets a valid form digest for the given site web URL, requesting a
    /// fresh one if the cached digest has expired.
    ///
    /// The returned value is the complete `FormDigestValue`, digest and
    /// timestamp both; SharePoint expects it verbatim in `X-RequestDigest`.
    #[instrument(skip(self))]
    pub async fn get_digest(&self, web_url: &str) -> SharePointResult<String> {
        {
            let digests = self.digests.read().await;
            if let Some(digest) = digests.get(web_url) {
                if Utc::now() < digest.expires_at {
                    debug!("Using cached form digest");
                    return Ok(digest.value.clone());
                }
            }
        }

        debug!("Requesting fresh form digest");
        let token = self.token_cache.get_token().await?;
        let response = self
            .http_client
            .post(format!("{web_url}/_api/contextinfo"))
            .bearer_auth(token)
            .header("Accept", "application/json;odata=nometadata")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SharePointError::Api {
                message: format!("contextinfo request failed with status {status}: {body}"),
            });
        }

        let info: ContextInfo = response.json().await?;
        let expires_at = digest_expiry(&info)?;
        let value = info.form_digest_value;

        {
            let mut digests = self.digests.write().await;
            digests.insert(
                web_url.to_string(),
                CachedDigest {
                    value: value.clone(),
                    expires_at,
                },
            );
        }

        Ok(value)
    }

    /// Seeds the cache with a known digest for a site web URL.
    pub async fn prime(
        &self,
        web_url: impl Into<String>,
        value: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) {
        let mut digests = self.digests.write().await;
        digests.insert(
            web_url.into(),
            CachedDigest {
                value: value.into(),
                expires_at,
            },
        );
    }
}

/// Computes the expiry of a digest from its embedded timestamp and the
/// server-reported timeout.
fn digest_expiry(info: &ContextInfo) -> SharePointResult<DateTime<Utc>> {
    let (_, timestamp) = info.form_digest_value.split_once(',').ok_or_else(|| {
        SharePointError::MalformedDigest {
            value: info.form_digest_value.clone(),
        }
    })?;

    let issued = DateTime::parse_from_str(timestamp.trim(), DIGEST_TIMESTAMP_FORMAT)
        .map_err(|_| SharePointError::MalformedDigest {
            value: info.form_digest_value.clone(),
        })?;

    Ok(issued.with_timezone(&Utc) + Duration::seconds(info.form_digest_timeout_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SharePointConfig, SharePointCredentials};
    use chrono::TimeZone;
    use secrecy::SecretString;

    fn context_info(value: &str, timeout: i64) -> ContextInfo {
        ContextInfo {
            form_digest_timeout_seconds: timeout,
            form_digest_value: value.to_string(),
            web_full_url: "https://tenant.sharepoint.com/sites/Example".to_string(),
            site_full_url: "https://tenant.sharepoint.com/sites/Example".to_string(),
        }
    }

    fn test_cache() -> FormDigestCache {
        let config = SharePointConfig::builder()
            .tenant_id("tenant-123")
            .sharepoint_domain("contoso")
            .login_endpoint("http://127.0.0.1:1")
            .build()
            .unwrap();
        let credentials = SharePointCredentials {
            client_id: "client-123".to_string(),
            client_secret: SecretString::from("secret"),
            pfx_certificate: "not a bundle".to_string(),
            pfx_password: SecretString::from("pw"),
        };
        let tokens = SharePointTokenCache::new(
            Arc::new(config),
            Arc::new(credentials),
            reqwest::Client::new(),
        );
        FormDigestCache::new(tokens, reqwest::Client::new())
    }

    #[test]
    fn test_digest_expiry_parses_timestamp() {
        let info = context_info("0xDIGEST,14 Jun 2024 10:00:00 +0000", 1800);
        let expires_at = digest_expiry(&info).unwrap();
        assert_eq!(
            expires_at,
            Utc.with_ymd_and_hms(2024, 6, 14, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_digest_expiry_handles_offset() {
        let info = context_info("0xDIGEST,14 Jun 2024 10:00:00 -0700", 60);
        let expires_at = digest_expiry(&info).unwrap();
        assert_eq!(
            expires_at,
            Utc.with_ymd_and_hms(2024, 6, 14, 17, 1, 0).unwrap()
        );
    }

    #[test]
    fn test_digest_without_timestamp_is_malformed() {
        let info = context_info("0xDIGESTONLY", 1800);
        let err = digest_expiry(&info).unwrap_err();
        assert!(matches!(err, SharePointError::MalformedDigest { .. }));
    }

    #[test]
    fn test_digest_with_bad_timestamp_is_malformed() {
        let info = context_info("0xDIGEST,not a timestamp", 1800);
        let err = digest_expiry(&info).unwrap_err();
        assert!(matches!(err, SharePointError::MalformedDigest { .. }));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let cache = test_cache();
        cache
            .prime(
                "https://tenant.sharepoint.com/sites/Example",
                "0xDIGEST,14 Jun 2024 10:00:00 +0000",
                Utc::now() + Duration::minutes(30),
            )
            .await;

        let digest = cache
            .get_digest("https://tenant.sharepoint.com/sites/Example")
            .await
            .unwrap();
        assert_eq!(digest, "0xDIGEST,14 Jun 2024 10:00:00 +0000");
    }

    #[tokio::test]
    async fn test_expired_digest_triggers_refresh() {
        let cache = test_cache();
        cache
            .prime(
                "https://tenant.sharepoint.com/sites/Example",
                "0xSTALE,14 Jun 2024 10:00:00 +0000",
                Utc::now() - Duration::seconds(1),
            )
            .await;

        // The refresh path needs a SharePoint token, and the token
        // endpoint is unroutable.
        let err = cache
            .get_digest("https://tenant.sharepoint.com/sites/Example")
            .await
            .unwrap_err();
        assert!(!matches!(err, SharePointError::MalformedDigest { .. }));
    }

    #[tokio::test]
    async fn test_digests_are_scoped_per_site() {
        let cache = test_cache();
        cache
            .prime(
                "https://tenant.sharepoint.com/sites/A",
                "0xAAA,14 Jun 2024 10:00:00 +0000",
                Utc::now() + Duration::minutes(30),
            )
            .await;
        cache
            .prime(
                "https://tenant.sharepoint.com/sites/B",
                "0xBBB,14 Jun 2024 10:00:00 +0000",
                Utc::now() + Duration::minutes(30),
            )
            .await;

        let a = cache
            .get_digest("https://tenant.sharepoint.com/sites/A")
            .await
            .unwrap();
        let b = cache
            .get_digest("https://tenant.sharepoint.com/sites/B")
            .await
            .unwrap();
        assert_eq!(a, "0xAAA,14 Jun 2024 10:00:00 +0000");
        assert_eq!(b, "0xBBB,14 Jun 2024 10:00:00 +0000");
    }
}
