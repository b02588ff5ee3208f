//! Common error types for Leadbook

use thiserror::Error;

/// Common result type for Leadbook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the shared model, config and audience helpers
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Payload could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
