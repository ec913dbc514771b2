//! Single-job execution.
//!
//! [`JobProcessor::dispatch`] runs one job end-to-end in a background task:
//!
//! 1. `pending -> processing`
//! 2. create a scratch workspace
//! 3. download the source when the engine needs it
//! 4. run the engine
//! 5. persist the validated result
//! 6. `processing -> completed`, or `-> error` with a detail on any failure
//!
//! The workspace is closed exactly once on every path; if the job task
//! panics, dropping the workspace removes it and the record is marked
//! `error` by the supervising task.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::Instrument;

use quill_media::{source_file_name, Downloader, Workspace};
use quill_models::{CacheKey, JobStatus};
use quill_queue::JobRegistry;
use quill_storage::ArtifactCache;

use crate::engines::{ComputeEngine, ComputeInput};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;

/// Handle to a dispatched job; resolves to the job's final status.
pub type JobHandle = JoinHandle<JobStatus>;

/// One unit of work.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub key: CacheKey,
    pub source_ref: String,
    pub aux_text: Option<String>,
}

impl JobRequest {
    pub fn new(source_ref: impl Into<String>, aux_text: Option<String>) -> Self {
        let source_ref = source_ref.into();
        Self {
            key: CacheKey::derive(&source_ref),
            source_ref,
            aux_text,
        }
    }
}

/// Runs jobs for one compute kind.
pub struct JobProcessor {
    engine: Arc<dyn ComputeEngine>,
    registry: Arc<JobRegistry>,
    cache: ArtifactCache,
    downloader: Downloader,
    work_dir: PathBuf,
}

impl JobProcessor {
    pub fn new(
        engine: Arc<dyn ComputeEngine>,
        registry: Arc<JobRegistry>,
        cache: ArtifactCache,
        downloader: Downloader,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            registry,
            cache,
            downloader,
            work_dir: work_dir.into(),
        }
    }

    /// Start `job` in the background. The caller must already hold the
    /// key's `pending` record.
    pub fn dispatch(self: &Arc<Self>, job: JobRequest) -> JobHandle {
        let processor = Arc::clone(self);
        let logger = JobLogger::new(self.engine.kind(), &job.key);
        let span = logger.create_span();

        tokio::spawn(
            async move {
                let key = job.key.clone();
                let inner = {
                    let processor = Arc::clone(&processor);
                    let logger = logger.clone();
                    tokio::spawn(
                        async move { processor.run(&job, &logger).await }
                            .instrument(tracing::Span::current()),
                    )
                };

                match inner.await {
                    Ok(status) => status,
                    Err(e) => {
                        let err = WorkerError::internal(format!("job task failed: {}", e));
                        logger.log_error(&err.to_string());
                        processor.mark_failed(&key, &err, &logger);
                        JobStatus::Error
                    }
                }
            }
            .instrument(span),
        )
    }

    async fn run(&self, job: &JobRequest, logger: &JobLogger) -> JobStatus {
        let kind = self.engine.kind();

        if let Err(e) = self
            .registry
            .transition(&job.key, JobStatus::Processing, None)
        {
            logger.log_error(&format!("cannot start job: {}", e));
            return self
                .registry
                .get(&job.key)
                .map(|r| r.status)
                .unwrap_or(JobStatus::Error);
        }

        logger.log_start(&job.source_ref);
        metrics::record_job_started(kind);
        let started = Instant::now();

        match self.execute(job, logger).await {
            Ok(()) => {
                let elapsed = started.elapsed().as_secs_f64();
                if let Err(e) = self
                    .registry
                    .transition(&job.key, JobStatus::Completed, None)
                {
                    // The artifact is persisted, so polls still resolve.
                    logger.log_warning(&format!("could not mark job completed: {}", e));
                }
                metrics::record_job_completed(kind, elapsed);
                logger.log_completion(&format!("took {:.2}s", elapsed));
                JobStatus::Completed
            }
            Err(err) => {
                let elapsed = started.elapsed().as_secs_f64();
                logger.log_error(&err.to_string());
                metrics::record_job_failed(kind, err.kind(), elapsed);
                self.mark_failed(&job.key, &err, logger);
                JobStatus::Error
            }
        }
    }

    /// Steps 2-5. The workspace is closed before returning, whatever the outcome.
    async fn execute(&self, job: &JobRequest, logger: &JobLogger) -> WorkerResult<()> {
        let workspace = Workspace::create(&self.work_dir)
            .await
            .map_err(|e| WorkerError::internal(format!("failed to create workspace: {}", e)))?;

        let result = self.compute_and_persist(job, &workspace, logger).await;
        workspace.close();
        result
    }

    async fn compute_and_persist(
        &self,
        job: &JobRequest,
        workspace: &Workspace,
        logger: &JobLogger,
    ) -> WorkerResult<()> {
        let asset = if self.engine.requires_asset() {
            let path = workspace.file(&source_file_name(&job.source_ref));
            let bytes = self
                .downloader
                .fetch_to_file(&job.source_ref, &path)
                .await
                .map_err(|e| WorkerError::download(e.to_string()))?;
            logger.log_progress(&format!("downloaded {} bytes", bytes));
            Some(path)
        } else {
            None
        };

        let value = self
            .engine
            .compute(ComputeInput {
                source_ref: &job.source_ref,
                asset: asset.as_deref(),
                aux_text: job.aux_text.as_deref(),
            })
            .await?;

        self.cache.put_json(&job.key, &value).await?;
        logger.log_progress("artifact persisted");
        Ok(())
    }

    fn mark_failed(&self, key: &CacheKey, err: &WorkerError, logger: &JobLogger) {
        if let Err(e) = self
            .registry
            .transition(key, JobStatus::Error, Some(err.detail()))
        {
            logger.log_warning(&format!("could not record failure: {}", e));
        }
    }
}
