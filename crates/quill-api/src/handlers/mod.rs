//! HTTP handlers.

pub mod batch;
pub mod health;
pub mod jobs;
pub mod queue;

pub use batch::submit_batch;
pub use health::{health, ready};
pub use jobs::{job_status, job_status_by_body, submit_job};
pub use queue::queue_status;

use validator::ValidationError;

/// Reject empty or whitespace-only strings.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
