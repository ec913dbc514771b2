//! Remote document text extraction client.

use quill_models::{truncate_for_detail, ExtractedDocument};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::http::{authorize, build_client, endpoint, read_body};

/// Client for the PDF text extraction provider. The document bytes are
/// uploaded as the request body.
#[derive(Debug, Clone)]
pub struct ExtractionClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ExtractionClient {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let base_url = config
            .extraction_url
            .clone()
            .ok_or(ProviderError::NotConfigured("EXTRACTION_API_URL"))?;

        Ok(Self {
            http: build_client(config.timeout)?,
            base_url,
            api_key: config.extraction_api_key.clone(),
        })
    }

    pub async fn extract(&self, document: Vec<u8>) -> ProviderResult<ExtractedDocument> {
        let url = endpoint(&self.base_url, "v1/extract");
        debug!(bytes = document.len(), "Sending extraction request to {}", url);

        let request = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/pdf")
            .body(document);
        let response = authorize(request, self.api_key.as_deref()).send().await?;
        let body = read_body(response).await?;

        let extracted = ExtractedDocument::parse(&body).map_err(|e| {
            ProviderError::InvalidResponse(format!(
                "{}; body: {}",
                e,
                truncate_for_detail(&body, 512)
            ))
        })?;

        info!(chars = extracted.text.len(), pages = ?extracted.pages, "Extraction received");
        Ok(extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base: &str) -> ProviderConfig {
        ProviderConfig {
            extraction_url: Some(format!("{}/", base)),
            ..ProviderConfig::default()
        }
    }

    #[tokio::test]
    async fn test_extract_uploads_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/extract"))
            .and(header("content-type", "application/pdf"))
            .and(body_bytes(b"%PDF-1.7 fake".to_vec()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "text": "Chapter one", "pages": 3 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ExtractionClient::new(&config(&server.uri())).unwrap();
        let doc = client.extract(b"%PDF-1.7 fake".to_vec()).await.unwrap();

        assert_eq!(doc.text, "Chapter one");
        assert_eq!(doc.pages, Some(3));
    }

    #[tokio::test]
    async fn test_extract_failure_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("not a pdf"))
            .mount(&server)
            .await;

        let client = ExtractionClient::new(&config(&server.uri())).unwrap();
        let err = client.extract(b"hello".to_vec()).await.unwrap_err();

        assert_eq!(err.status(), Some(422));
    }
}
