//! Error types for the homework clients

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the review API or the Telegram Bot API
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an unexpected status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message or body excerpt from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Telegram answered 2xx but with `"ok": false`
    #[error("Request rejected: {description}")]
    Rejected {
        /// Telegram `error_code`, when present
        error_code: Option<i64>,
        /// Telegram `description`
        description: String,
    },
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Wraps a transport error, dropping the URL so bot tokens embedded in
    /// request paths never reach the logs
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        Self::RequestFailed(err.without_url())
    }

    /// HTTP status code, if the API answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            Self::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
