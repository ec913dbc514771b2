//! Job lifecycle status and records.
//!
//! A [`JobRecord`] is the registry's view of one computation for one cache
//! key. Records only move forward through
//! `pending -> processing -> {completed, error}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CacheKey, ComputeKind};

/// Job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job record installed, worker not started yet
    #[default]
    Pending,
    /// Job is actively being processed
    Processing,
    /// Job completed and the artifact was persisted
    Completed,
    /// Job failed with an error
    Error,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Pending, JobStatus::Error)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Error)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Registry entry for one cache key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Cache key of the job
    pub key: CacheKey,
    /// Which computation this job runs
    pub kind: ComputeKind,
    /// Current status
    pub status: JobStatus,
    /// Failure detail when `status == Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    /// When the record was installed
    pub created_at: DateTime<Utc>,
    /// When the status last changed
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a new pending record.
    pub fn pending(key: CacheKey, kind: ComputeKind) -> Self {
        let now = Utc::now();
        Self {
            key,
            kind,
            status: JobStatus::Pending,
            error_detail: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Update the status and bump the updated_at timestamp.
    pub fn set_status(&mut self, status: JobStatus, detail: Option<String>) {
        self.status = status;
        self.error_detail = detail;
        self.updated_at = Utc::now();
    }

    /// Whether the record has outlived `ttl` since its last update.
    pub fn is_expired(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        now - self.updated_at >= ttl
    }
}
