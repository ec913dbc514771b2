//! Forced-alignment results.
//!
//! The external aligner prints one JSON document on stdout:
//!
//! ```json
//! {
//!   "segments": [{ "start": 0.0, "end": 1.2, "text": "hi there",
//!                  "words": [{ "word": "hi", "start": 0.0, "end": 0.4, "score": 0.9 }] }],
//!   "word_segments": [{ "word": "hi", "start": 0.0, "end": 0.4, "score": 0.9 }]
//! }
//! ```
//!
//! The output is untrusted; [`AlignmentResult::parse`] validates it before
//! anything is persisted.

use serde::{Deserialize, Serialize};

use crate::error::{PayloadError, PayloadResult};

/// A single aligned word. Timing can be absent for tokens the aligner
/// could not place (numbers, symbols).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedWord {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

/// A transcript segment with its aligned words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub words: Vec<AlignedWord>,
}

/// Complete alignment artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    pub segments: Vec<AlignedSegment>,
    #[serde(default)]
    pub word_segments: Vec<AlignedWord>,
    /// Reference text supplied with the job (batch auxiliary text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_text: Option<String>,
}

impl AlignmentResult {
    /// Parse and validate raw aligner output.
    pub fn parse(raw: &str) -> PayloadResult<Self> {
        let result: AlignmentResult = serde_json::from_str(raw.trim())?;
        result.validate()?;
        Ok(result)
    }

    /// Check timing invariants.
    pub fn validate(&self) -> PayloadResult<()> {
        for (i, seg) in self.segments.iter().enumerate() {
            check_span(seg.start, seg.end)
                .map_err(|e| PayloadError::invalid(format!("segment {}: {}", i, e)))?;
            for word in &seg.words {
                check_word(word)
                    .map_err(|e| PayloadError::invalid(format!("segment {}: {}", i, e)))?;
            }
        }
        for (i, word) in self.word_segments.iter().enumerate() {
            check_word(word)
                .map_err(|e| PayloadError::invalid(format!("word_segment {}: {}", i, e)))?;
        }
        Ok(())
    }

    /// Number of words with timing information.
    pub fn timed_word_count(&self) -> usize {
        self.word_segments
            .iter()
            .filter(|w| w.start.is_some() && w.end.is_some())
            .count()
    }
}

fn check_span(start: f64, end: f64) -> Result<(), String> {
    if !start.is_finite() || !end.is_finite() {
        return Err("non-finite timestamp".to_string());
    }
    if start < 0.0 || end < start {
        return Err(format!("invalid span {}..{}", start, end));
    }
    Ok(())
}

fn check_word(word: &AlignedWord) -> Result<(), String> {
    match (word.start, word.end) {
        (Some(start), Some(end)) => check_span(start, end)
            .map_err(|e| format!("word {:?}: {}", word.word, e)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "segments": [
            {"start": 0.0, "end": 1.5, "text": "hello world",
             "words": [{"word": "hello", "start": 0.0, "end": 0.6, "score": 0.98},
                       {"word": "world", "start": 0.7, "end": 1.5, "score": 0.91}]}
        ],
        "word_segments": [
            {"word": "hello", "start": 0.0, "end": 0.6, "score": 0.98},
            {"word": "world", "start": 0.7, "end": 1.5, "score": 0.91},
            {"word": "42"}
        ]
    }"#;

    #[test]
    fn test_parse_aligner_output() {
        let result = AlignmentResult::parse(SAMPLE).unwrap();
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].words.len(), 2);
        assert_eq!(result.word_segments.len(), 3);
        assert_eq!(result.timed_word_count(), 2);
        assert!(result.reference_text.is_none());
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = AlignmentResult::parse("[PYTHON_LOG] done").unwrap_err();
        assert!(matches!(err, PayloadError::Json(_)));
    }

    #[test]
    fn test_parse_rejects_missing_segments() {
        assert!(AlignmentResult::parse(r#"{"word_segments": []}"#).is_err());
    }

    #[test]
    fn test_parse_rejects_reversed_span() {
        let raw = r#"{"segments": [{"start": 2.0, "end": 1.0, "text": "x"}]}"#;
        let err = AlignmentResult::parse(raw).unwrap_err();
        assert!(matches!(err, PayloadError::Invalid(_)));
    }

    #[test]
    fn test_parse_rejects_negative_word_time() {
        let raw = r#"{"segments": [], "word_segments": [{"word": "a", "start": -1.0, "end": 0.5}]}"#;
        assert!(AlignmentResult::parse(raw).is_err());
    }
}
