use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("API error: {0}")]
    ApiError(#[from] soundtouch_api::ApiError),

    #[error("Event stream error: {0}")]
    StreamError(#[from] soundtouch_stream::StreamError),

    #[error("Selector state error: {0}")]
    StateError(#[from] soundtouch_state::StateError),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        let err: SdkError = soundtouch_api::ApiError::Transport("refused".to_string()).into();
        assert_eq!(err.to_string(), "API error: Transport error: refused");

        let err: SdkError = soundtouch_state::StateError::InvalidPresetIndex(9).into();
        assert!(matches!(err, SdkError::StateError(_)));

        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(SdkError::from(parse), SdkError::ConfigParse(_)));
    }
}
