//! Error types for local job resources.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors from downloads, scratch space and worker processes.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Worker program not found: {0}")]
    WorkerNotFound(String),

    #[error("Worker failed: {message}")]
    WorkerFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Worker output exceeded {limit} bytes")]
    OutputTooLarge { limit: usize },

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("Download exceeded {limit} bytes")]
    DownloadTooLarge { limit: u64 },

    #[error("Unsupported source reference: {0}")]
    UnsupportedSource(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a worker failure error.
    pub fn worker_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::WorkerFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the error happened while fetching the source asset.
    pub fn is_download(&self) -> bool {
        matches!(
            self,
            Self::DownloadFailed { .. } | Self::DownloadTooLarge { .. } | Self::UnsupportedSource(_)
        )
    }
}

impl From<reqwest::Error> for MediaError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::download_failed(format!("request timed out: {}", e))
        } else {
            Self::download_failed(e.to_string())
        }
    }
}
