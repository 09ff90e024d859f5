//! Connector framework error types.

use thiserror::Error;

/// Result type alias using [`ConnectorError`].
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Errors raised by the connector framework itself.
///
/// Connector implementations define their own richer error types and convert
/// into these at the framework boundary.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// A page cursor could not be decoded.
    #[error("invalid page cursor: {message}")]
    InvalidCursor { message: String },

    /// A resource, entitlement, or grant record could not be built from
    /// upstream data.
    #[error("cannot build {kind} record: {message}")]
    ResourceBuild { kind: String, message: String },

    /// A sync or provisioning operation against the upstream system failed.
    #[error("operation failed: {message}")]
    Operation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The connector does not support the requested operation.
    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },
}

impl ConnectorError {
    /// Wraps an upstream error into an operation failure.
    pub fn operation(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::Operation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
