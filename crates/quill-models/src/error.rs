//! Payload validation errors.

use thiserror::Error;

pub type PayloadResult<T> = Result<T, PayloadError>;

/// Errors raised while parsing or validating model payloads.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid payload: {0}")]
    Invalid(String),
}

impl PayloadError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
