//! Cache-first orchestration for one compute kind.
//!
//! Submit order is registry, then store, then `try_set_pending`: an
//! in-flight job wins over everything, a stored artifact wins over
//! recomputation, and only the caller that installs `pending` dispatches.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use quill_models::{CacheKey, ComputeKind, JobRecord, JobStatus};
use quill_queue::JobRegistry;
use quill_storage::ArtifactCache;

use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::processor::{JobHandle, JobProcessor, JobRequest};

/// Result of a submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The artifact already exists.
    Cached {
        key: CacheKey,
        result: serde_json::Value,
    },
    /// A new job was dispatched.
    Started { key: CacheKey, handle: JobHandle },
    /// Another job for the same key is already running.
    InFlight { key: CacheKey, status: JobStatus },
}

impl SubmitOutcome {
    pub fn key(&self) -> &CacheKey {
        match self {
            SubmitOutcome::Cached { key, .. }
            | SubmitOutcome::Started { key, .. }
            | SubmitOutcome::InFlight { key, .. } => key,
        }
    }
}

/// Result of a status poll.
#[derive(Debug)]
pub enum PollOutcome {
    /// Pending or processing.
    InFlight(JobRecord),
    Completed {
        key: CacheKey,
        result: serde_json::Value,
    },
    Failed {
        key: CacheKey,
        error: String,
    },
    /// No live record and no artifact.
    Unknown,
}

pub struct Pipeline {
    kind: ComputeKind,
    registry: Arc<JobRegistry>,
    cache: ArtifactCache,
    processor: Arc<JobProcessor>,
    poll_interval: Duration,
}

impl Pipeline {
    pub fn new(
        registry: Arc<JobRegistry>,
        cache: ArtifactCache,
        processor: Arc<JobProcessor>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            kind: cache.kind(),
            registry,
            cache,
            processor,
            poll_interval,
        }
    }

    pub fn kind(&self) -> ComputeKind {
        self.kind
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Submit a source reference for background computation.
    pub async fn submit(
        &self,
        source_ref: &str,
        aux_text: Option<String>,
    ) -> WorkerResult<SubmitOutcome> {
        if source_ref.trim().is_empty() {
            return Err(WorkerError::validation("sourceRef must not be blank"));
        }
        let job = JobRequest::new(source_ref, aux_text);
        let key = job.key.clone();

        if let Some(record) = self.registry.get(&key) {
            if !record.is_terminal() {
                debug!(kind = %self.kind, job_key = %key.short(), status = %record.status, "Job already in flight");
                return Ok(SubmitOutcome::InFlight {
                    key,
                    status: record.status,
                });
            }
        }

        if let Some(artifact) = self.cache.lookup(&key).await? {
            metrics::record_cache_lookup(self.kind, true);
            return Ok(SubmitOutcome::Cached {
                key,
                result: artifact.to_json()?,
            });
        }
        metrics::record_cache_lookup(self.kind, false);

        if !self.registry.try_set_pending(&key) {
            let status = self
                .registry
                .get(&key)
                .map(|r| r.status)
                .unwrap_or(JobStatus::Pending);
            if status != JobStatus::Completed {
                return Ok(SubmitOutcome::InFlight { key, status });
            }

            // The artifact is written before the record turns completed, so
            // a second miss means the artifact is gone and the job reruns.
            if let Some(artifact) = self.cache.lookup(&key).await? {
                return Ok(SubmitOutcome::Cached {
                    key,
                    result: artifact.to_json()?,
                });
            }
            if !self.registry.try_reclaim_completed(&key) {
                let status = self
                    .registry
                    .get(&key)
                    .map(|r| r.status)
                    .unwrap_or(JobStatus::Pending);
                return Ok(SubmitOutcome::InFlight { key, status });
            }
            warn!(kind = %self.kind, job_key = %key.short(), "Completed job has no artifact, recomputing");
        }

        info!(kind = %self.kind, job_key = %key.short(), "Dispatching job");
        let handle = self.processor.dispatch(job);
        Ok(SubmitOutcome::Started { key, handle })
    }

    /// Resolve the current state of `key`.
    ///
    /// Completed results come from the store, so they stay visible after
    /// the registry record has expired.
    pub async fn poll(&self, key: &CacheKey) -> WorkerResult<PollOutcome> {
        match self.registry.get(key) {
            Some(record) if !record.is_terminal() => Ok(PollOutcome::InFlight(record)),
            Some(record) if record.status == JobStatus::Error => Ok(PollOutcome::Failed {
                key: key.clone(),
                error: record
                    .error_detail
                    .unwrap_or_else(|| "job failed".to_string()),
            }),
            _ => match self.cache.lookup(key).await? {
                Some(artifact) => Ok(PollOutcome::Completed {
                    key: key.clone(),
                    result: artifact.to_json()?,
                }),
                None => Ok(PollOutcome::Unknown),
            },
        }
    }

    /// Return the artifact for `source_ref`, computing it inline on a miss.
    ///
    /// Joins an in-flight job for the same key instead of starting another.
    pub async fn fetch_or_compute(&self, source_ref: &str) -> WorkerResult<serde_json::Value> {
        match self.submit(source_ref, None).await? {
            SubmitOutcome::Cached { result, .. } => Ok(result),
            SubmitOutcome::Started { key, handle } => {
                if let Err(e) = handle.await {
                    return Err(WorkerError::internal(format!(
                        "job {} task failed: {}",
                        key.short(),
                        e
                    )));
                }
                self.finish(&key).await
            }
            SubmitOutcome::InFlight { key, .. } => {
                self.registry
                    .wait_for_terminal(&key, self.poll_interval)
                    .await;
                self.finish(&key).await
            }
        }
    }

    async fn finish(&self, key: &CacheKey) -> WorkerResult<serde_json::Value> {
        match self.poll(key).await? {
            PollOutcome::Completed { result, .. } => Ok(result),
            PollOutcome::Failed { error, .. } => Err(WorkerError::JobFailed(error)),
            PollOutcome::InFlight(record) => Err(WorkerError::JobFailed(format!(
                "job {} still {}",
                key.short(),
                record.status
            ))),
            PollOutcome::Unknown => Err(WorkerError::JobFailed(format!(
                "job {} finished without an artifact",
                key.short()
            ))),
        }
    }

    /// Wait until the job for `key` is terminal (or gone).
    pub async fn wait(&self, key: &CacheKey) -> Option<JobRecord> {
        self.registry.wait_for_terminal(key, self.poll_interval).await
    }
}
