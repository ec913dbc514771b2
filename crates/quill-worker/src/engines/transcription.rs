use async_trait::async_trait;

use quill_models::ComputeKind;
use quill_providers::{ProviderConfig, TranscriptionClient};

use super::{ComputeEngine, ComputeInput};
use crate::error::{WorkerError, WorkerResult};

/// Speech-to-text through the remote provider. The provider fetches the
/// audio from the source URL itself.
#[derive(Debug, Clone)]
pub struct TranscriptionEngine {
    client: Result<TranscriptionClient, String>,
}

impl TranscriptionEngine {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: TranscriptionClient::new(config).map_err(|e| e.to_string()),
        }
    }
}

#[async_trait]
impl ComputeEngine for TranscriptionEngine {
    fn kind(&self) -> ComputeKind {
        ComputeKind::Transcription
    }

    fn requires_asset(&self) -> bool {
        false
    }

    async fn compute(&self, input: ComputeInput<'_>) -> WorkerResult<serde_json::Value> {
        let client = self
            .client
            .as_ref()
            .map_err(|e| WorkerError::Upstream(e.clone()))?;

        let transcript = client.transcribe(input.source_ref).await?;
        serde_json::to_value(&transcript).map_err(|e| WorkerError::internal(e.to_string()))
    }
}
