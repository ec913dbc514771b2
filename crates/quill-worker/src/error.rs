//! Worker error types.
//!
//! Every job failure ends up as one of these, rendered into the job
//! record's error detail by [`WorkerError::detail`].

use quill_media::MediaError;
use quill_models::truncate_for_detail;
use quill_providers::ProviderError;
use quill_queue::QueueError;
use quill_storage::StorageError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Longest stderr tail kept in an error detail.
const STDERR_DETAIL_BYTES: usize = 4096;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Worker process failed: {message}")]
    Subprocess {
        message: String,
        exit_code: Option<i32>,
        stderr: Option<String>,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Registry error: {0}")]
    Queue(#[from] QueueError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short label for metrics and error details.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::Validation(_) => "validation",
            WorkerError::Storage(_) => "storage",
            WorkerError::Download(_) => "download",
            WorkerError::Upstream(_) => "upstream",
            WorkerError::Subprocess { .. } => "subprocess",
            WorkerError::Parse(_) => "parse",
            WorkerError::JobFailed(_) => "job",
            WorkerError::Queue(_) => "registry",
            WorkerError::Internal(_) => "internal",
        }
    }

    /// Error detail stored on a failed job record.
    pub fn detail(&self) -> String {
        let mut detail = format!("{}: {}", self.kind(), self);
        if let WorkerError::Subprocess {
            exit_code, stderr, ..
        } = self
        {
            if let Some(code) = exit_code {
                detail.push_str(&format!("\nexit code: {}", code));
            }
            if let Some(stderr) = stderr.as_deref().filter(|s| !s.trim().is_empty()) {
                detail.push_str("\nstderr:\n");
                detail.push_str(&tail_for_detail(stderr.trim_end(), STDERR_DETAIL_BYTES));
            }
        }
        detail
    }
}

impl From<MediaError> for WorkerError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::WorkerFailed {
                message,
                stderr,
                exit_code,
            } => WorkerError::Subprocess {
                message,
                exit_code,
                stderr,
            },
            MediaError::WorkerNotFound(_) | MediaError::Timeout(_) => WorkerError::Subprocess {
                message: e.to_string(),
                exit_code: None,
                stderr: None,
            },
            MediaError::OutputTooLarge { .. } => WorkerError::Parse(e.to_string()),
            e if e.is_download() => WorkerError::Download(e.to_string()),
            e => WorkerError::Internal(e.to_string()),
        }
    }
}

impl From<ProviderError> for WorkerError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::InvalidResponse(msg) => WorkerError::Parse(msg),
            e => WorkerError::Upstream(e.to_string()),
        }
    }
}

/// Keep the last `max_bytes` of `text`; the end of a worker's stderr is
/// where its error usually is.
fn tail_for_detail(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut cut = text.len() - max_bytes;
    while !text.is_char_boundary(cut) {
        cut += 1;
    }
    format!("[... {} bytes omitted]\n{}", cut, &text[cut..])
}

/// Bound raw worker output quoted in a parse error.
pub(crate) fn quote_output(output: &str) -> String {
    truncate_for_detail(output.trim(), 2048)
}
