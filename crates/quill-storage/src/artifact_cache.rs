//! Per-kind artifact cache on top of an [`ArtifactStore`].
//!
//! Each compute kind owns a namespace in the bucket so the same source
//! reference can be transcribed and aligned without key collisions.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use quill_models::{CacheKey, ComputeKind};

use crate::error::StorageResult;
use crate::store::{ArtifactStore, StoredArtifact};

/// Generate the object key for an artifact.
///
/// Format: `{namespace}/{cache_key}.json`
pub fn artifact_key(kind: ComputeKind, key: &CacheKey) -> String {
    format!("{}/{}.json", kind.namespace(), key)
}

/// Store handle scoped to one compute kind.
#[derive(Clone)]
pub struct ArtifactCache {
    store: Arc<dyn ArtifactStore>,
    kind: ComputeKind,
}

impl ArtifactCache {
    pub fn new(store: Arc<dyn ArtifactStore>, kind: ComputeKind) -> Self {
        Self { store, kind }
    }

    pub fn kind(&self) -> ComputeKind {
        self.kind
    }

    /// Cache-first lookup.
    ///
    /// `Ok(None)` is a miss. Any failure other than not-found is returned as
    /// an error so callers never recompute because of an outage.
    pub async fn lookup(&self, key: &CacheKey) -> StorageResult<Option<StoredArtifact>> {
        let object_key = artifact_key(self.kind, key);
        match self.store.get(&object_key).await {
            Ok(artifact) => {
                debug!(key = %object_key, "Artifact cache hit");
                Ok(Some(artifact))
            }
            Err(e) if e.is_not_found() => {
                debug!(key = %object_key, "Artifact cache miss");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Persist a JSON artifact.
    pub async fn put_json<T: Serialize>(&self, key: &CacheKey, value: &T) -> StorageResult<()> {
        let artifact = StoredArtifact::json(value)?;
        let object_key = artifact_key(self.kind, key);
        debug!(
            key = %object_key,
            size = artifact.bytes.len(),
            "Storing artifact"
        );
        self.store.put(&object_key, artifact).await
    }
}
