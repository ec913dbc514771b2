//! Remote transcription API client.

use quill_models::{truncate_for_detail, Transcript};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::http::{authorize, build_client, endpoint, read_body};

#[derive(Debug, Serialize)]
struct TranscribeRequest<'a> {
    audio_url: &'a str,
    speaker_labels: bool,
}

/// Client for the speech-to-text provider.
///
/// The provider fetches the audio itself, so only the source URL is sent.
#[derive(Debug, Clone)]
pub struct TranscriptionClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl TranscriptionClient {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let base_url = config
            .transcription_url
            .clone()
            .ok_or(ProviderError::NotConfigured("TRANSCRIPTION_API_URL"))?;

        Ok(Self {
            http: build_client(config.timeout)?,
            base_url,
            api_key: config.transcription_api_key.clone(),
        })
    }

    /// Transcribe the audio at `audio_url` with speaker labels.
    pub async fn transcribe(&self, audio_url: &str) -> ProviderResult<Transcript> {
        let url = endpoint(&self.base_url, "v1/transcribe");
        debug!("Sending transcription request to {}", url);

        let request = self.http.post(&url).json(&TranscribeRequest {
            audio_url,
            speaker_labels: true,
        });
        let response = authorize(request, self.api_key.as_deref()).send().await?;
        let body = read_body(response).await?;

        let transcript = Transcript::parse(&body).map_err(|e| {
            ProviderError::InvalidResponse(format!(
                "{}; body: {}",
                e,
                truncate_for_detail(&body, 512)
            ))
        })?;

        info!(
            utterances = transcript.utterances.len(),
            "Transcription received"
        );
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base: &str) -> ProviderConfig {
        ProviderConfig {
            transcription_url: Some(base.to_string()),
            transcription_api_key: Some("secret".to_string()),
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn test_requires_url() {
        let err = TranscriptionClient::new(&ProviderConfig::default()).unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_transcribe() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/transcribe"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({
                "audio_url": "https://cdn.example.com/ep1.mp3",
                "speaker_labels": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "hello there",
                "language": "en",
                "utterances": [
                    { "speaker": "A", "start": 0.0, "end": 1.5, "text": "hello there" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TranscriptionClient::new(&config(&server.uri())).unwrap();
        let transcript = client
            .transcribe("https://cdn.example.com/ep1.mp3")
            .await
            .unwrap();

        assert_eq!(transcript.text, "hello there");
        assert_eq!(transcript.speakers(), vec!["A"]);
    }

    #[tokio::test]
    async fn test_provider_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = TranscriptionClient::new(&config(&server.uri())).unwrap();
        let err = client.transcribe("https://x/a.mp3").await.unwrap_err();

        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains("upstream down"));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = TranscriptionClient::new(&config(&server.uri())).unwrap();
        let err = client.transcribe("https://x/a.mp3").await.unwrap_err();

        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}
