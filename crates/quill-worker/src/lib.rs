//! Job orchestration.
//!
//! This crate provides:
//! - Compute engines for transcription, extraction and alignment
//! - `JobProcessor`: one job end-to-end with guaranteed cleanup
//! - `Pipeline`: cache-first submit, poll and inline fetch per kind
//! - `Orchestrator`: the three pipelines plus the alignment batch queue

pub mod batch;
pub mod config;
pub mod engines;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod pipeline;
pub mod processor;

pub use batch::{prepare_batch, AlignmentBatchRunner};
pub use config::WorkerConfig;
pub use engines::{
    AlignmentEngine, ComputeEngine, ComputeInput, Engines, ExtractionEngine, TranscriptionEngine,
};
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
pub use orchestrator::{Orchestrator, QueueStatus};
pub use pipeline::{Pipeline, PollOutcome, SubmitOutcome};
pub use processor::{JobHandle, JobProcessor, JobRequest};
