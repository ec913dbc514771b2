//! Ephemeral job registry.
//!
//! The registry is the authority for "is this key being computed right
//! now". Records expire a fixed time after their last update; expiry is
//! applied lazily on read and by an optional periodic sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use quill_models::{CacheKey, ComputeKind, JobRecord, JobStatus};

use crate::error::{QueueError, QueueResult};

/// Default record lifetime after the last update.
pub const DEFAULT_JOB_TTL: Duration = Duration::from_secs(60 * 60);

/// Live record counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub error: usize,
}

impl StatusCounts {
    /// Jobs not yet terminal.
    pub fn in_flight(&self) -> usize {
        self.pending + self.processing
    }
}

/// Job records for one compute kind.
#[derive(Debug)]
pub struct JobRegistry {
    kind: ComputeKind,
    records: DashMap<CacheKey, JobRecord>,
    ttl: chrono::Duration,
}

impl JobRegistry {
    pub fn new(kind: ComputeKind, ttl: Duration) -> Self {
        Self {
            kind,
            records: DashMap::new(),
            ttl: chrono::Duration::from_std(ttl)
                .unwrap_or_else(|_| chrono::Duration::days(365)),
        }
    }

    pub fn kind(&self) -> ComputeKind {
        self.kind
    }

    /// Current record for `key`, if one is live.
    pub fn get(&self, key: &CacheKey) -> Option<JobRecord> {
        let now = Utc::now();
        self.records.remove_if(key, |_, r| r.is_expired(self.ttl, now));
        self.records.get(key).map(|entry| entry.value().clone())
    }

    /// Atomically install a `pending` record.
    ///
    /// Succeeds when no live record exists or the live record is `error`,
    /// so a failed job can be resubmitted without waiting for expiry.
    /// Returns `false` when the key is in flight or recently completed.
    pub fn try_set_pending(&self, key: &CacheKey) -> bool {
        let now = Utc::now();
        match self.records.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let record = entry.get();
                if record.is_expired(self.ttl, now) || record.status == JobStatus::Error {
                    entry.insert(JobRecord::pending(key.clone(), self.kind));
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(JobRecord::pending(key.clone(), self.kind));
                true
            }
        }
    }

    /// Replace a live `completed` record with a fresh `pending` one.
    ///
    /// Used when the artifact a completed job wrote is missing from the
    /// store. Returns `false` unless the live record is `completed`.
    pub fn try_reclaim_completed(&self, key: &CacheKey) -> bool {
        let now = Utc::now();
        match self.records.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let record = entry.get();
                if record.status == JobStatus::Completed && !record.is_expired(self.ttl, now) {
                    entry.insert(JobRecord::pending(key.clone(), self.kind));
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Move `key` to `status`.
    ///
    /// Rejects transitions the lifecycle does not allow, including any
    /// transition of an absent or expired key, without touching state.
    pub fn transition(
        &self,
        key: &CacheKey,
        status: JobStatus,
        detail: Option<String>,
    ) -> QueueResult<JobRecord> {
        let now = Utc::now();
        let rejected = |from: Option<JobStatus>| QueueError::InvalidTransition {
            key: key.short().to_string(),
            from,
            to: status,
        };

        let Some(mut record) = self.records.get_mut(key) else {
            warn!(kind = %self.kind, job_key = %key.short(), to = %status, "Transition for absent job");
            return Err(rejected(None));
        };

        if record.is_expired(self.ttl, now) {
            warn!(kind = %self.kind, job_key = %key.short(), to = %status, "Transition for expired job");
            return Err(rejected(None));
        }

        if !record.status.can_transition_to(status) {
            warn!(
                kind = %self.kind,
                job_key = %key.short(),
                from = %record.status,
                to = %status,
                "Rejected job transition"
            );
            return Err(rejected(Some(record.status)));
        }

        record.set_status(status, detail);
        debug!(kind = %self.kind, job_key = %key.short(), status = %status, "Job transitioned");
        Ok(record.clone())
    }

    /// Poll until `key` is terminal or gone. Returns the terminal record, or
    /// `None` if the record disappeared first.
    pub async fn wait_for_terminal(&self, key: &CacheKey, interval: Duration) -> Option<JobRecord> {
        loop {
            match self.get(key) {
                Some(record) if record.is_terminal() => return Some(record),
                Some(_) => tokio::time::sleep(interval).await,
                None => return None,
            }
        }
    }

    /// Count live records by status.
    pub fn counts(&self) -> StatusCounts {
        let now = Utc::now();
        let mut counts = StatusCounts::default();
        for entry in self.records.iter() {
            let record = entry.value();
            if record.is_expired(self.ttl, now) {
                continue;
            }
            match record.status {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::Processing => counts.processing += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Error => counts.error += 1,
            }
        }
        counts
    }

    /// Drop every expired record, returning how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let before = self.records.len();
        self.records.retain(|_, r| !r.is_expired(self.ttl, now));
        before.saturating_sub(self.records.len())
    }

    /// Run [`sweep`](Self::sweep) every `interval` until the task is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = registry.sweep();
                if removed > 0 {
                    debug!(kind = %registry.kind, removed, "Swept expired job records");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
