//! Artifact storage.
//!
//! This crate provides:
//! - The `ArtifactStore` contract (exists/get/put, NotFound kept distinct)
//! - Cloudflare R2 implementation over the S3 API
//! - In-memory implementation for development and tests
//! - Per-kind artifact cache with namespaced object keys

pub mod artifact_cache;
pub mod client;
pub mod error;
pub mod memory;
pub mod store;

pub use artifact_cache::{artifact_key, ArtifactCache};
pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryArtifactStore;
pub use store::{ArtifactStore, StoredArtifact, CONTENT_TYPE_JSON};
