//! Axum HTTP API server.
//!
//! This crate provides:
//! - Submit and poll endpoints for transcription, extraction and alignment
//! - Batch alignment intake
//! - Health, readiness and queue status probes
//! - Request id, logging, security header and CORS middleware
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
