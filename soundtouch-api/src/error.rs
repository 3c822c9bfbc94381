use http_client::HttpError;
use thiserror::Error;

/// High-level API errors for SoundTouch operations
///
/// The command protocol has no retry or cancel primitive, so none of these
/// are retried internally. Callers decide whether to try again.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network communication error
    ///
    /// Connection refused, DNS failure, timeout. Surfaced as-is, never retried.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response could not be parsed or has an unexpected shape
    ///
    /// Treated as non-retryable since it points at a firmware mismatch.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The device answered with an `<errors>` document
    #[error("Device rejected '{action}': {reason}")]
    Rejected { action: String, reason: String },

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The serial command worker is gone
    #[error("Command queue closed")]
    QueueClosed,
}

impl ApiError {
    pub(crate) fn missing(element: &str, field: &str) -> Self {
        Self::Protocol(format!("<{}> is missing '{}'", element, field))
    }

    pub(crate) fn unexpected_root(expected: &str, found: &str) -> Self {
        Self::Protocol(format!("Expected <{}> but found <{}>", expected, found))
    }

    /// Whether this error came from the network rather than the device
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<HttpError> for ApiError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::Network(msg) => ApiError::Transport(msg),
            HttpError::Parse(msg) => ApiError::Protocol(msg),
        }
    }
}
