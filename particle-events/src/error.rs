//! Error types for event subscriptions
//!
//! Parse failures never surface here: a frame that does not decode simply
//! produces no record. The cache has no failure modes either. What remains
//! is configuration and transport.

use thiserror::Error;

/// Errors returned to the embedding application
#[derive(Debug, Error)]
pub enum EventsError {
    /// Configuration validation failed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Event stream connection or transport error
    #[error("Event stream error: {0}")]
    Stream(#[from] StreamError),
}

/// Errors specific to the event stream transport
#[derive(Debug, Error)]
pub enum StreamError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// HTTP response status error
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),

    /// Access token could not be read
    #[error("Failed to load access token: {0}")]
    TokenLoad(std::io::Error),

    /// The server ended the stream
    #[error("Event stream closed by server")]
    Closed,

    /// The configured reconnect budget ran out
    #[error("Gave up after {disconnects} disconnects")]
    RetriesExhausted { disconnects: u32 },
}

impl StreamError {
    /// Check if this is a fatal error that should not be retried
    ///
    /// Fatal errors include:
    /// - 401 Unauthorized / 403 Forbidden (token is invalid or lacks access)
    /// - Token file that cannot be read
    /// - An exhausted reconnect budget
    ///
    /// Everything else (network failures, 5xx, a closed stream) is transient.
    pub fn is_fatal(&self) -> bool {
        match self {
            StreamError::HttpStatus(status) => {
                status.as_u16() == 401 || status.as_u16() == 403
            }
            StreamError::TokenLoad(_) | StreamError::RetriesExhausted { .. } => true,
            StreamError::Request(_) | StreamError::Closed => false,
        }
    }
}
