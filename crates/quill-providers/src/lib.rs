//! Remote compute providers.
//!
//! Both providers are one-shot: a single request returns the finished
//! result, so callers never poll the provider itself.

pub mod config;
pub mod error;
pub mod extraction;
mod http;
pub mod transcription;

pub use config::ProviderConfig;
pub use error::{ProviderError, ProviderResult};
pub use extraction::ExtractionClient;
pub use transcription::TranscriptionClient;
