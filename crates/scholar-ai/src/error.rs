//! Error types for model and vector index calls.

use thiserror::Error;

/// Errors that can occur when talking to the hosted AI services.
#[derive(Error, Debug)]
pub enum AiError {
    /// Unable to reach the service.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request timeout.
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// API returned an error response.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Response did not have the expected shape.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Retrieval stack was not built because credentials are missing.
    #[error("Retrieval backend is not configured")]
    NotConfigured,

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for AI operations.
pub type AiResult<T> = Result<T, AiError>;

impl AiError {
    /// Classify a transport error from reqwest.
    pub(crate) fn from_transport(e: reqwest::Error, target: &str, timeout_secs: u64) -> Self {
        if e.is_connect() {
            AiError::Connection(format!("unable to reach {}", target))
        } else if e.is_timeout() {
            AiError::Timeout {
                seconds: timeout_secs,
            }
        } else {
            AiError::Http(e)
        }
    }
}
