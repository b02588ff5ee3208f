//! Client error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    /// Request never got an HTTP answer
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with an error status; `message` is its `error` field
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    /// Saving a note needs a selected lead or client
    #[error("No record selected")]
    NoSelection,

    #[error("Unknown note: {0}")]
    UnknownNote(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<leadbook_common::Error> for ClientError {
    fn from(err: leadbook_common::Error) -> Self {
        match err {
            leadbook_common::Error::InvalidInput(msg) => ClientError::InvalidInput(msg),
            other => ClientError::Decode(other.to_string()),
        }
    }
}
