//! Structured job logging.

use tracing::{error, info, warn, Span};

use quill_models::{CacheKey, ComputeKind};

/// Logger carrying the job's key and operation on every event.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_key: String,
    operation: &'static str,
}

impl JobLogger {
    pub fn new(kind: ComputeKind, key: &CacheKey) -> Self {
        Self {
            job_key: key.short().to_string(),
            operation: kind.as_str(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_key = %self.job_key,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_key = %self.job_key,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_key = %self.job_key,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_key = %self.job_key,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_key = %self.job_key,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn job_key(&self) -> &str {
        &self.job_key
    }

    pub fn operation(&self) -> &str {
        self.operation
    }

    /// Span for instrumenting the whole job future.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_key = %self.job_key,
            operation = %self.operation
        )
    }
}
