//! Error types for weekboard-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid RRULE: {0}")]
    InvalidRule(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid value for {property}: {value}")]
    InvalidValue { property: String, value: String },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Feed parse error: {0}")]
    Feed(String),

    #[error("No week window for {0}")]
    Window(String),

    #[error("Recurrence expansion stopped at {0} instances; later occurrences are missing")]
    ExpansionLimit(u16),
}

impl EngineError {
    pub(crate) fn invalid_value(property: &str, value: &str) -> Self {
        EngineError::InvalidValue {
            property: property.to_string(),
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
