use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One structured field error from the gateway, e.g.
/// `{"loc": ["body", "due_amount"], "msg": "field required"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub location: Vec<String>,
    pub message: String,
}

impl FieldError {
    /// The offending field: the last location segment ("body" and friends
    /// are scopes, not fields).
    pub fn field_name(&self) -> &str {
        self.location.last().map(String::as_str).unwrap_or("form")
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned {status}: {message}")]
    Rejected {
        status: u16,
        message: String,
        field_errors: Vec<FieldError>,
    },

    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Rejected { status, .. } => Some(*status),
            GatewayError::Transport(err) => err.status().map(|s| s.as_u16()),
            GatewayError::Decode(_) => None,
        }
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            GatewayError::Rejected { field_errors, .. } => field_errors,
            _ => &[],
        }
    }
}
