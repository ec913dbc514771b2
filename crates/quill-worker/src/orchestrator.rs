//! Wiring of the three pipelines and the batch queue.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::info;

use quill_media::Downloader;
use quill_models::{BatchEntry, ComputeKind};
use quill_queue::{BatchQueue, JobRegistry, StatusCounts};
use quill_storage::{ArtifactCache, ArtifactStore};

use crate::batch::{prepare_batch, AlignmentBatchRunner};
use crate::config::WorkerConfig;
use crate::engines::Engines;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::pipeline::Pipeline;
use crate::processor::JobProcessor;

/// Backlog and registry snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub batch_queued: usize,
    pub batch_active: usize,
    pub transcription: StatusCounts,
    pub extraction: StatusCounts,
    pub alignment: StatusCounts,
}

pub struct Orchestrator {
    transcription: Arc<Pipeline>,
    extraction: Arc<Pipeline>,
    alignment: Arc<Pipeline>,
    batch: BatchQueue,
    store: Arc<dyn ArtifactStore>,
}

impl Orchestrator {
    /// Build every pipeline over `store` and start the batch pump.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        config: &WorkerConfig,
        store: Arc<dyn ArtifactStore>,
        engines: Engines,
    ) -> WorkerResult<Self> {
        let downloader = Downloader::new(config.download_timeout, config.max_download_bytes)
            .map_err(|e| WorkerError::internal(e.to_string()))?;

        let build = |kind: ComputeKind| -> Arc<Pipeline> {
            let registry = Arc::new(JobRegistry::new(kind, config.job_ttl));
            let cache = ArtifactCache::new(Arc::clone(&store), kind);
            let processor = Arc::new(JobProcessor::new(
                Arc::clone(engines.get(kind)),
                Arc::clone(&registry),
                cache.clone(),
                downloader.clone(),
                config.work_dir.clone(),
            ));
            Arc::new(Pipeline::new(
                registry,
                cache,
                processor,
                config.batch_poll_interval,
            ))
        };

        let transcription = build(ComputeKind::Transcription);
        let extraction = build(ComputeKind::Extraction);
        let alignment = build(ComputeKind::Alignment);

        let runner = Arc::new(AlignmentBatchRunner::new(Arc::clone(&alignment)));
        let batch = BatchQueue::start(runner, config.batch_max_concurrent);

        info!(
            work_dir = %config.work_dir.display(),
            job_ttl_secs = config.job_ttl.as_secs(),
            "Orchestrator ready"
        );

        Ok(Self {
            transcription,
            extraction,
            alignment,
            batch,
            store,
        })
    }

    pub fn pipeline(&self, kind: ComputeKind) -> &Arc<Pipeline> {
        match kind {
            ComputeKind::Transcription => &self.transcription,
            ComputeKind::Extraction => &self.extraction,
            ComputeKind::Alignment => &self.alignment,
        }
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Resolve auxiliary texts, then queue the entries for alignment.
    /// Returns the number of entries accepted.
    pub async fn submit_batch(&self, entries: Vec<BatchEntry>) -> WorkerResult<usize> {
        let prepared = prepare_batch(&self.extraction, entries).await;
        let accepted = self
            .batch
            .enqueue_all(prepared)
            .map_err(WorkerError::from)?;
        metrics::set_batch_backlog(self.batch.len());
        info!(accepted, backlog = self.batch.len(), "Batch enqueued");
        Ok(accepted)
    }

    pub fn queue_status(&self) -> QueueStatus {
        metrics::set_batch_backlog(self.batch.len());
        QueueStatus {
            batch_queued: self.batch.len(),
            batch_active: self.batch.active(),
            transcription: self.transcription.registry().counts(),
            extraction: self.extraction.registry().counts(),
            alignment: self.alignment.registry().counts(),
        }
    }

    /// Periodically drop expired records from every registry.
    pub fn spawn_sweepers(&self, interval: Duration) -> Vec<JoinHandle<()>> {
        ComputeKind::ALL
            .iter()
            .map(|kind| self.pipeline(*kind).registry().spawn_sweeper(interval))
            .collect()
    }
}
