//! Error types for the gateway client.

use thiserror::Error;

/// Gateway-specific errors.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP request error: {0}")]
    Request(String),

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Connection refused or failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// HTTP error status (4xx or 5xx), carrying the raw response body text
    /// when the server supplied one.
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("no response body"))]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// Verbatim response body, if non-empty.
        message: Option<String>,
    },
}

impl GatewayError {
    /// The text to show the user for this failure.
    ///
    /// When the server supplied response text it is surfaced verbatim;
    /// everything else falls back to the caller's generic (translated)
    /// message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::HttpStatus {
                message: Some(text),
                ..
            } => text.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::Json(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// A specialized Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
