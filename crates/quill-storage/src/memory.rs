//! In-memory artifact store.
//!
//! Backs `STORE_BACKEND=memory` for local development and every test that
//! needs a store. Reads and writes can each be switched into a failing
//! mode to simulate a store outage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{StorageError, StorageResult};
use crate::store::{ArtifactStore, StoredArtifact};

#[derive(Default)]
pub struct MemoryArtifactStore {
    objects: RwLock<HashMap<String, StoredArtifact>>,
    puts: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put` calls served so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of objects currently stored.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Make `exists`/`get` fail with a non-NotFound error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make `put` fail without storing anything.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> StorageResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::download_failed("simulated store outage"));
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.check_reads()?;
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn get(&self, key: &str) -> StorageResult<StoredArtifact> {
        self.check_reads()?;
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn put(&self, key: &str, artifact: StoredArtifact) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::upload_failed("simulated store outage"));
        }
        self.objects.write().await.insert(key.to_string(), artifact);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        self.check_reads()
    }
}
