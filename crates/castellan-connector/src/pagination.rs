//! Opaque page cursor for list operations.
//!
//! The host platform drives list calls with a cursor it treats as an opaque
//! string; connectors that paginate (e.g. via `@odata.nextLink`) store the
//! upstream continuation token inside it. APIs without server-side paging
//! simply finish in one page.

use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, ConnectorResult};

/// Cursor state threaded through successive list calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    /// Upstream continuation token for the next page, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

impl PageCursor {
    /// Decodes a cursor from its wire form. An empty string is the initial
    /// cursor.
    pub fn decode(raw: &str) -> ConnectorResult<Self> {
        if raw.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).map_err(|e| ConnectorError::InvalidCursor {
            message: e.to_string(),
        })
    }

    /// Encodes the cursor for the wire. Returns an empty string when there
    /// are no more pages, which callers treat as end-of-listing.
    pub fn encode(&self) -> ConnectorResult<String> {
        if self.token.is_none() {
            return Ok(String::new());
        }
        serde_json::to_string(self).map_err(|e| ConnectorError::InvalidCursor {
            message: e.to_string(),
        })
    }

    /// The continuation token for the next upstream request, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Records the continuation token returned by the upstream system.
    /// `None` marks the listing as complete.
    pub fn set_next(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Whether the listing is complete.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.token.is_none()
    }
}
