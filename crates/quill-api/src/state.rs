//! Application state.

use std::sync::Arc;

use tracing::info;

use quill_providers::ProviderConfig;
use quill_storage::{ArtifactStore, MemoryArtifactStore, R2Client};
use quill_worker::{Engines, Orchestrator, WorkerConfig};

use crate::config::{ApiConfig, StoreBackend};
use crate::error::ApiResult;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(config: ApiConfig, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    /// Build the store, engines and orchestrator from the environment.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_env(config: ApiConfig) -> ApiResult<Self> {
        let store = artifact_store(config.store_backend)?;
        let worker_config = WorkerConfig::from_env();
        let provider_config = ProviderConfig::from_env();

        if provider_config.transcription_url.is_none() {
            tracing::warn!("TRANSCRIPTION_API_URL not set; transcription jobs will fail");
        }
        if provider_config.extraction_url.is_none() {
            tracing::warn!("EXTRACTION_API_URL not set; extraction jobs will fail");
        }

        let engines = Engines::from_config(&worker_config, &provider_config);
        let orchestrator = Orchestrator::new(&worker_config, store, engines)?;
        Ok(Self::new(config, Arc::new(orchestrator)))
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        self.orchestrator.store()
    }
}

fn artifact_store(backend: StoreBackend) -> ApiResult<Arc<dyn ArtifactStore>> {
    match backend {
        StoreBackend::R2 => {
            info!("Using R2 artifact store");
            Ok(Arc::new(R2Client::from_env()?))
        }
        StoreBackend::Memory => {
            info!("Using in-memory artifact store; artifacts are lost on restart");
            Ok(Arc::new(MemoryArtifactStore::new()))
        }
    }
}
