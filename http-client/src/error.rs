//! Error types for the HTTP client

use thiserror::Error;

/// Errors that can occur while talking to a device over HTTP
#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection refused, timeout, or any other transport failure
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// The response body is not well-formed XML
    #[error("XML parsing error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(error: reqwest::Error) -> Self {
        HttpError::Network(error.to_string())
    }
}
