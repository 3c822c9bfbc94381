//! Error types for the soundtouch-stream crate.

use soundtouch_api::ApiError;

/// Errors raised by the event stream and the polling fallback
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The WebSocket handshake failed or timed out
    #[error("Failed to connect event stream: {0}")]
    Connect(String),

    /// An established connection failed
    #[error("Event stream transport error: {0}")]
    Transport(String),

    /// A frame could not be parsed
    #[error("Failed to parse update frame: {0}")]
    Parse(String),

    /// A query issued by the polling fallback failed
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Convenience type alias for Results using StreamError.
pub type Result<T> = std::result::Result<T, StreamError>;
