//! Queue error types.

use quill_models::JobStatus;
use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Invalid transition for job {key}: {} -> {to}", .from.map(|s| s.as_str()).unwrap_or("absent"))]
    InvalidTransition {
        key: String,
        from: Option<JobStatus>,
        to: JobStatus,
    },

    #[error("Batch queue is closed")]
    Closed,
}
