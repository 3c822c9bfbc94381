//! Error types for soundtouch-state

use std::fmt;

/// Result type for soundtouch-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors raised while building or updating the selector registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Two selectors map to the same tag
    DuplicateSelector(String),

    /// Preset slots are numbered 1 to 6
    InvalidPresetIndex(u8),

    /// `SelectorIdentity::None` has no entity of its own
    UntaggedSelector,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::DuplicateSelector(tag) => write!(f, "Duplicate selector: {}", tag),
            StateError::InvalidPresetIndex(index) => {
                write!(f, "Invalid preset index {}: expected 1 to 6", index)
            }
            StateError::UntaggedSelector => write!(f, "The empty selection cannot be registered"),
        }
    }
}

impl std::error::Error for StateError {}
