//! Transcription results.

use serde::{Deserialize, Serialize};

use crate::error::{PayloadError, PayloadResult};

/// One diarized utterance. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Complete transcription artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub utterances: Vec<Utterance>,
}

impl Transcript {
    /// Parse and validate a provider response body.
    pub fn parse(raw: &str) -> PayloadResult<Self> {
        let transcript: Transcript = serde_json::from_str(raw.trim())?;
        for (i, u) in transcript.utterances.iter().enumerate() {
            if !u.start.is_finite() || !u.end.is_finite() || u.start < 0.0 || u.end < u.start {
                return Err(PayloadError::invalid(format!(
                    "utterance {} has invalid span {}..{}",
                    i, u.start, u.end
                )));
            }
        }
        Ok(transcript)
    }

    /// Distinct speaker labels in order of first appearance.
    pub fn speakers(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for speaker in self.utterances.iter().filter_map(|u| u.speaker.as_deref()) {
            if !seen.contains(&speaker) {
                seen.push(speaker);
            }
        }
        seen
    }
}
