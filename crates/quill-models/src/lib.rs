//! Shared data models for the Quill orchestrator.
//!
//! This crate provides Serde-serializable types for:
//! - Cache keys derived from source references
//! - Compute kinds (transcription, extraction, alignment)
//! - Job records and the job lifecycle status
//! - Batch entries
//! - Result payloads persisted to the artifact store

pub mod alignment;
pub mod batch;
pub mod cache_key;
pub mod document;
pub mod error;
pub mod job_status;
pub mod kind;
pub mod transcript;
pub mod utils;

// Re-export common types
pub use alignment::{AlignedSegment, AlignedWord, AlignmentResult};
pub use batch::BatchEntry;
pub use cache_key::CacheKey;
pub use document::ExtractedDocument;
pub use error::{PayloadError, PayloadResult};
pub use job_status::{JobRecord, JobStatus};
pub use kind::ComputeKind;
pub use transcript::{Transcript, Utterance};
pub use utils::{is_http_url, truncate_for_detail};
