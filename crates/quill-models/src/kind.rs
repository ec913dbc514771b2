//! Compute kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The external computation a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeKind {
    /// Speech-to-text with speaker labels (remote API)
    Transcription,
    /// Document text extraction (remote API)
    Extraction,
    /// Forced word-level alignment (local external worker)
    Alignment,
}

impl ComputeKind {
    pub const ALL: [ComputeKind; 3] = [
        ComputeKind::Transcription,
        ComputeKind::Extraction,
        ComputeKind::Alignment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeKind::Transcription => "transcription",
            ComputeKind::Extraction => "extraction",
            ComputeKind::Alignment => "alignment",
        }
    }

    /// Store namespace for artifacts of this kind.
    pub fn namespace(&self) -> &'static str {
        match self {
            ComputeKind::Transcription => "transcripts",
            ComputeKind::Extraction => "documents",
            ComputeKind::Alignment => "alignments",
        }
    }
}

impl fmt::Display for ComputeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_namespaces_are_distinct() {
        let ns: HashSet<_> = ComputeKind::ALL.iter().map(|k| k.namespace()).collect();
        assert_eq!(ns.len(), ComputeKind::ALL.len());
    }
}
