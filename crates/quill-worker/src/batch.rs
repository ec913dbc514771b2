//! Alignment batches.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use quill_models::{is_http_url, BatchEntry, ExtractedDocument, JobStatus};
use quill_queue::BatchRunner;

use crate::metrics;
use crate::pipeline::{Pipeline, SubmitOutcome};

/// Drives one batch entry through the alignment pipeline and holds its
/// queue slot until the job is terminal.
pub struct AlignmentBatchRunner {
    alignment: Arc<Pipeline>,
}

impl AlignmentBatchRunner {
    pub fn new(alignment: Arc<Pipeline>) -> Self {
        Self { alignment }
    }
}

#[async_trait]
impl BatchRunner for AlignmentBatchRunner {
    async fn run_entry(&self, entry: BatchEntry) {
        let outcome = match self
            .alignment
            .submit(&entry.source_ref, entry.aux_text)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(source_ref = %entry.source_ref, "Batch entry failed to start: {}", e);
                return;
            }
        };

        let status = match outcome {
            SubmitOutcome::Cached { key, .. } => {
                debug!(job_key = %key.short(), "Batch entry already cached");
                Some(JobStatus::Completed)
            }
            SubmitOutcome::Started { key, handle } => match handle.await {
                Ok(status) => Some(status),
                Err(e) => {
                    error!(job_key = %key.short(), "Batch job task failed: {}", e);
                    None
                }
            },
            SubmitOutcome::InFlight { key, .. } => {
                self.alignment.wait(&key).await.map(|record| record.status)
            }
        };

        debug!(source_ref = %entry.source_ref, status = ?status, "Batch entry finished");
    }
}

/// Resolve each entry's auxiliary text before it is queued.
///
/// A URL is replaced by the extracted document text, cache-first against
/// the extraction store. Literal text is kept. A URL that cannot be
/// resolved is dropped with a warning; it never rejects the batch.
pub async fn prepare_batch(extraction: &Pipeline, entries: Vec<BatchEntry>) -> Vec<BatchEntry> {
    let mut prepared = Vec::with_capacity(entries.len());

    for mut entry in entries {
        if let Some(aux) = entry.aux_text.take() {
            entry.aux_text = resolve_aux_text(extraction, aux).await;
        }
        prepared.push(entry);
    }

    metrics::record_batch_accepted(prepared.len());
    prepared
}

async fn resolve_aux_text(extraction: &Pipeline, aux: String) -> Option<String> {
    if !is_http_url(&aux) {
        return Some(aux);
    }

    let value = match extraction.fetch_or_compute(aux.trim()).await {
        Ok(value) => value,
        Err(e) => {
            warn!(aux_url = %aux, "Could not resolve auxiliary text, continuing without it: {}", e);
            return None;
        }
    };

    match serde_json::from_value::<ExtractedDocument>(value) {
        Ok(document) => Some(document.text),
        Err(e) => {
            warn!(aux_url = %aux, "Stored extraction is malformed, continuing without it: {}", e);
            None
        }
    }
}
