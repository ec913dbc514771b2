//! Job and cache metrics.

use metrics::{counter, gauge, histogram};

use quill_models::ComputeKind;

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_STARTED_TOTAL: &str = "quill_jobs_started_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "quill_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "quill_jobs_failed_total";
    pub const JOB_DURATION_SECONDS: &str = "quill_job_duration_seconds";

    pub const CACHE_HITS_TOTAL: &str = "quill_cache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "quill_cache_misses_total";

    pub const BATCH_BACKLOG: &str = "quill_batch_backlog";
    pub const BATCH_ENTRIES_TOTAL: &str = "quill_batch_entries_total";
}

pub fn record_job_started(kind: ComputeKind) {
    counter!(names::JOBS_STARTED_TOTAL, "kind" => kind.as_str()).increment(1);
}

pub fn record_job_completed(kind: ComputeKind, duration_secs: f64) {
    counter!(names::JOBS_COMPLETED_TOTAL, "kind" => kind.as_str()).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "kind" => kind.as_str(), "outcome" => "completed")
        .record(duration_secs);
}

/// Record a failed job, labelled with the error kind.
pub fn record_job_failed(kind: ComputeKind, error_kind: &'static str, duration_secs: f64) {
    counter!(names::JOBS_FAILED_TOTAL, "kind" => kind.as_str(), "error" => error_kind).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "kind" => kind.as_str(), "outcome" => "error")
        .record(duration_secs);
}

pub fn record_cache_lookup(kind: ComputeKind, hit: bool) {
    if hit {
        counter!(names::CACHE_HITS_TOTAL, "kind" => kind.as_str()).increment(1);
    } else {
        counter!(names::CACHE_MISSES_TOTAL, "kind" => kind.as_str()).increment(1);
    }
}

pub fn record_batch_accepted(count: usize) {
    counter!(names::BATCH_ENTRIES_TOTAL).increment(count as u64);
}

pub fn set_batch_backlog(length: usize) {
    gauge!(names::BATCH_BACKLOG).set(length as f64);
}
