//! Error types for Slack operations.

use thiserror::Error;

/// Errors that can occur while talking to Slack or checking its requests.
#[derive(Error, Debug)]
pub enum SlackError {
    /// Slack answered `ok: false`.
    #[error("Slack API error: {0}")]
    Api(String),

    /// API rate limited.
    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// Operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Request signature verification failed.
    #[error("Signature verification failed: {0}")]
    SignatureVerification(String),
}

impl From<reqwest::Error> for SlackError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SlackError::Timeout(err.to_string())
        } else if err.is_decode() {
            SlackError::Json(err.to_string())
        } else if err.is_connect() {
            SlackError::Network(format!("Connection failed: {}", err))
        } else {
            SlackError::Network(err.to_string())
        }
    }
}

impl From<SlackError> for pipeline::ResolveError {
    fn from(err: SlackError) -> Self {
        pipeline::ResolveError(err.to_string())
    }
}

/// Result type for Slack operations.
pub type SlackResult<T> = std::result::Result<T, SlackError>;
