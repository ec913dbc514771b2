//! The artifact store contract.

use async_trait::async_trait;

use crate::error::StorageResult;

/// Content type for JSON artifacts.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Opaque payload plus its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl StoredArtifact {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// Serialize `value` as a JSON artifact.
    pub fn json<T: serde::Serialize>(value: &T) -> StorageResult<Self> {
        Ok(Self::new(serde_json::to_vec(value)?, CONTENT_TYPE_JSON))
    }

    /// Decode the payload as JSON.
    pub fn to_json(&self) -> StorageResult<serde_json::Value> {
        Ok(serde_json::from_slice(&self.bytes)?)
    }
}

/// Durable blob store keyed by object key.
///
/// Reads are consistent with preceding writes to the same key. `put` is
/// unconditional: a second write silently replaces the first.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Fetch an object. Missing objects yield `StorageError::NotFound`.
    async fn get(&self, key: &str) -> StorageResult<StoredArtifact>;

    /// Write an object.
    async fn put(&self, key: &str, artifact: StoredArtifact) -> StorageResult<()>;

    /// Check connectivity to the backing service.
    async fn check_connectivity(&self) -> StorageResult<()> {
        Ok(())
    }
}
