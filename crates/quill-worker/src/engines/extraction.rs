use async_trait::async_trait;
use tracing::debug;

use quill_models::ComputeKind;
use quill_providers::{ExtractionClient, ProviderConfig};

use super::{ComputeEngine, ComputeInput};
use crate::error::{WorkerError, WorkerResult};

/// Document text extraction through the remote provider. The downloaded
/// document is uploaded as-is.
#[derive(Debug, Clone)]
pub struct ExtractionEngine {
    client: Result<ExtractionClient, String>,
}

impl ExtractionEngine {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: ExtractionClient::new(config).map_err(|e| e.to_string()),
        }
    }
}

#[async_trait]
impl ComputeEngine for ExtractionEngine {
    fn kind(&self) -> ComputeKind {
        ComputeKind::Extraction
    }

    fn requires_asset(&self) -> bool {
        true
    }

    async fn compute(&self, input: ComputeInput<'_>) -> WorkerResult<serde_json::Value> {
        let client = self
            .client
            .as_ref()
            .map_err(|e| WorkerError::Upstream(e.clone()))?;
        let asset = input
            .asset
            .ok_or_else(|| WorkerError::internal("extraction requires a downloaded asset"))?;

        let document = tokio::fs::read(asset)
            .await
            .map_err(|e| WorkerError::internal(format!("failed to read asset: {}", e)))?;
        debug!(bytes = document.len(), "Uploading document for extraction");

        let extracted = client.extract(document).await?;
        serde_json::to_value(&extracted).map_err(|e| WorkerError::internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_bytes, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_uploads_asset_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/extract"))
            .and(body_bytes(b"%PDF-1.4".to_vec()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "text": "Once upon a time" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let asset = dir.path().join("source.pdf");
        tokio::fs::write(&asset, b"%PDF-1.4").await.unwrap();

        let engine = ExtractionEngine::new(&ProviderConfig {
            extraction_url: Some(server.uri()),
            ..ProviderConfig::default()
        });
        let value = engine
            .compute(ComputeInput {
                source_ref: "https://x/book.pdf",
                asset: Some(&asset),
                aux_text: None,
            })
            .await
            .unwrap();

        assert_eq!(value["text"], "Once upon a time");
    }
}
