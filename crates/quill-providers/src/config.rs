//! Provider configuration.

use std::time::Duration;

/// Endpoints and credentials for the remote providers.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the transcription API
    pub transcription_url: Option<String>,
    pub transcription_api_key: Option<String>,
    /// Base URL of the extraction API
    pub extraction_url: Option<String>,
    pub extraction_api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            transcription_url: None,
            transcription_api_key: None,
            extraction_url: None,
            extraction_api_key: None,
            timeout: Duration::from_secs(600), // long recordings take minutes
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            transcription_url: non_empty_var("TRANSCRIPTION_API_URL"),
            transcription_api_key: non_empty_var("TRANSCRIPTION_API_KEY"),
            extraction_url: non_empty_var("EXTRACTION_API_URL"),
            extraction_api_key: non_empty_var("EXTRACTION_API_KEY"),
            timeout: Duration::from_secs(
                std::env::var("PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
