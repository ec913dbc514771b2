//! Provider error types.

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Provider returned {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ProviderError {
    /// HTTP status returned by the provider, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
