//! Client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success response; `code` is the server's error kind when it sent one
    #[error("Server returned {status} ({code}): {message}")]
    Server {
        status: u16,
        code: String,
        message: String,
    },
}

impl ClientError {
    /// Server error kind, e.g. `token_not_yet_redeemable`
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Server { code, .. } => Some(code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
