//! JumpServer client errors

use thiserror::Error;

/// Errors that can occur when interacting with the JumpServer API
#[derive(Debug, Error)]
pub enum JumpServerError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JumpServer API returned an unexpected status
    #[error("JumpServer API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication failed (bad credentials, token rejected twice, etc.)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists (e.g. an asset with the same hostname)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid request (e.g., missing required fields)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl JumpServerError {
    /// True for failures of the conversation with JumpServer itself
    /// (network, auth, unexpected status) as opposed to a definite answer
    /// about a resource.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Api(_) | Self::Authentication(_) | Self::Serialization(_)
        )
    }
}
