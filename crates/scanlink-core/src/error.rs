//! Error types for core domain operations.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while building or parsing core value types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A settings value could not be parsed.
    #[error("Invalid setting: {message}")]
    InvalidSetting { message: String },

    /// A default parameter table could not be loaded.
    #[error("Defaults table error: {message}")]
    DefaultsTable { message: String },

    /// Generic configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Create a new invalid setting error.
    pub fn invalid_setting(message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            message: message.into(),
        }
    }

    /// Create a new defaults table error.
    pub fn defaults_table(message: impl Into<String>) -> Self {
        Self::DefaultsTable {
            message: message.into(),
        }
    }

    /// Create a generic configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
