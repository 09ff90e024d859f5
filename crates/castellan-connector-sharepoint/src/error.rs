//! Error types for the SharePoint connector.

use thiserror::Error;

use crate::model::PrincipalType;

/// Result type alias using [`SharePointError`].
pub type SharePointResult<T> = Result<T, SharePointError>;

/// Errors that can occur when syncing SharePoint.
#[derive(Debug, Error)]
pub enum SharePointError {
    /// Configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The PKCS#12 bundle could not be decoded, or the password is wrong.
    #[error("cannot decode .pfx certificate: {0}")]
    CertificateDecode(String),

    /// The certificate's private key is not RSA.
    #[error("unsupported certificate key: {0}")]
    UnsupportedKey(String),

    /// The token endpoint answered without an access token.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// The `FormDigestValue` from `_api/contextinfo` is not in the
    /// `"{value},{timestamp}"` shape.
    #[error("malformed form digest value '{value}'")]
    MalformedDigest { value: String },

    /// A recognized claims-prefixed login name has fewer than three pipe
    /// segments.
    #[error("malformed login name '{login_name}'")]
    MalformedLoginName { login_name: String },

    /// A principal whose login name and principal type match no grant rule.
    ///
    /// Listing paths log and skip this error instead of aborting the site's
    /// sync.
    #[error("unrecognized principal '{login_name}' of principal type {principal_type}")]
    UnrecognizedPrincipal {
        login_name: String,
        principal_type: PrincipalType,
    },

    /// Microsoft API error, already rewritten into operator guidance where
    /// the failure is a known one.
    #[error("Entra/SharePoint API error: {message}")]
    Api { message: String },

    /// Missing consent for the listing that was attempted.
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Framework error (page cursors, record building).
    #[error(transparent)]
    Connector(#[from] castellan_connector::error::ConnectorError),
}

impl SharePointError {
    /// Whether this error marks a single principal as unrepresentable, as
    /// opposed to a transport or parse failure that should abort the sync.
    #[must_use]
    pub fn is_unrecognized_principal(&self) -> bool {
        matches!(self, SharePointError::UnrecognizedPrincipal { .. })
    }
}

impl From<SharePointError> for castellan_connector::error::ConnectorError {
    fn from(err: SharePointError) -> Self {
        castellan_connector::error::ConnectorError::Operation {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_principal_is_distinguishable() {
        let err = SharePointError::UnrecognizedPrincipal {
            login_name: "c:0?.x|mystery|value".to_string(),
            principal_type: PrincipalType::SharePointGroup,
        };
        assert!(err.is_unrecognized_principal());
        assert!(err.to_string().contains("SharePoint Group"));

        let other = SharePointError::TokenExchange("empty token".to_string());
        assert!(!other.is_unrecognized_principal());
    }

    #[test]
    fn test_framework_conversion_preserves_message() {
        let err = SharePointError::MalformedDigest {
            value: "no-comma".to_string(),
        };
        let framework: castellan_connector::error::ConnectorError = err.into();
        assert!(framework.to_string().contains("no-comma"));
    }
}
