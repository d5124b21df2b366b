//! Store error types.

/// Errors produced by document store calls.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store rejected the request: {0}")]
    Rejected(String),

    #[error("store call timed out")]
    Timeout,

    #[error("store is offline")]
    Offline,
}
