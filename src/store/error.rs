use reqwest::header::InvalidHeaderValue;
use thiserror::*;

/// The one failure kind of the transport. Variants only carry diagnostics:
/// callers treat every one of them the same way.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to the task store failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("task store answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response from the task store: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("store url {0} cannot hold a collection path")]
    BadUrl(String),

    #[error("invalid request header: {0}")]
    Header(#[from] InvalidHeaderValue),

    #[error("task store unavailable: {0}")]
    Unavailable(String),
}

impl TransportError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        TransportError::Status {
            status: 404,
            body: format!("{} not found", what),
        }
    }
}
