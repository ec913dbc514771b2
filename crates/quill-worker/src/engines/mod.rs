//! Compute engines.
//!
//! An engine performs the external computation for one kind and returns
//! the validated result, ready to persist. Engines never touch the
//! registry or the store; [`JobProcessor`](crate::JobProcessor) owns that.

mod alignment;
mod extraction;
mod transcription;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use quill_models::ComputeKind;
use quill_providers::ProviderConfig;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;

pub use alignment::AlignmentEngine;
pub use extraction::ExtractionEngine;
pub use transcription::TranscriptionEngine;

/// Inputs for one computation.
#[derive(Debug, Clone, Copy)]
pub struct ComputeInput<'a> {
    /// Reference the job was submitted with
    pub source_ref: &'a str,
    /// Downloaded asset, present when the engine requires one
    pub asset: Option<&'a Path>,
    /// Resolved auxiliary text (alignment reference)
    pub aux_text: Option<&'a str>,
}

#[async_trait]
pub trait ComputeEngine: Send + Sync {
    fn kind(&self) -> ComputeKind;

    /// Whether the source must be downloaded into the workspace first.
    fn requires_asset(&self) -> bool;

    /// Run the computation and return the validated JSON result.
    async fn compute(&self, input: ComputeInput<'_>) -> WorkerResult<serde_json::Value>;
}

/// One engine per compute kind.
#[derive(Clone)]
pub struct Engines {
    pub transcription: Arc<dyn ComputeEngine>,
    pub extraction: Arc<dyn ComputeEngine>,
    pub alignment: Arc<dyn ComputeEngine>,
}

impl Engines {
    /// Build the production engines.
    ///
    /// Providers without a configured URL still get an engine; their jobs
    /// fail with an upstream error instead of preventing startup.
    pub fn from_config(worker: &WorkerConfig, providers: &ProviderConfig) -> Self {
        Self {
            transcription: Arc::new(TranscriptionEngine::new(providers)),
            extraction: Arc::new(ExtractionEngine::new(providers)),
            alignment: Arc::new(AlignmentEngine::from_config(worker)),
        }
    }

    pub fn get(&self, kind: ComputeKind) -> &Arc<dyn ComputeEngine> {
        match kind {
            ComputeKind::Transcription => &self.transcription,
            ComputeKind::Extraction => &self.extraction,
            ComputeKind::Alignment => &self.alignment,
        }
    }
}
