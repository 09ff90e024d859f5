//! Translation of Microsoft OAuth error bodies into operator guidance.
//!
//! The token and Graph endpoints answer failures with the standard
//! `{error, error_description, error_codes[], error_uri}` shape. A handful
//! of descriptions come up constantly during connector setup; those are
//! rewritten into messages that say what to fix. Everything else passes
//! through as `{type}: {description}`.

use serde::Deserialize;

/// Microsoft's standard OAuth error response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExplainedError {
    #[serde(rename = "error")]
    pub error_type: String,
    #[serde(rename = "error_description")]
    pub description: String,
    #[serde(rename = "error_codes")]
    pub codes: Vec<i64>,
    #[serde(rename = "error_uri")]
    pub uri: String,
}

impl ExplainedError {
    /// Whether the body carried any usable description.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_empty()
    }

    /// The actionable message for this error.
    #[must_use]
    pub fn message(&self) -> String {
        if self
            .description
            .contains("Reason - The key was not found., Thumbprint of key used by client")
        {
            return format!(
                "{}: certificate used by client is unknown to the server, did you upload the CRT certificate at 'App Registration'?",
                self.error_type
            );
        }
        if self
            .description
            .contains("AADSTS900023: Specified tenant identifier")
        {
            return format!(
                "{}: the 'Directory (Tenant) ID' specified is invalid",
                self.error_type
            );
        }
        if self
            .description
            .contains("AADSTS7000215: Invalid client secret provided")
        {
            return format!(
                "{}: the 'Client Secret' specified is invalid. Please ensure *you did not* pass the client secret's ID instead!",
                self.error_type
            );
        }

        format!("{}: {}", self.error_type, self.description)
    }
}

/// Parses an error body and produces the message to surface, or `None` when
/// the body carries no recognizable OAuth error shape.
#[must_use]
pub fn explain_body(body: &str) -> Option<String> {
    let explained: ExplainedError = serde_json::from_str(body).ok()?;
    if explained.is_empty() {
        return None;
    }
    Some(explained.message())
}

/// Guidance for a 403 on SharePoint membership listings: the usual cause is
/// missing admin consent rather than a transient failure.
#[must_use]
pub fn membership_permission_hint() -> String {
    "listing site membership was denied; grant admin consent for \
     'Sites.FullControl.All' (SharePoint) or 'User.Read.All' (Graph) to the app registration"
        .to_string()
}
