//! Batch entries.

use serde::{Deserialize, Serialize};

/// A unit of work waiting for its turn in the batch queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    /// Source reference (audio URL)
    pub source_ref: String,
    /// Auxiliary text: either literal text or a URL to a document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aux_text: Option<String>,
}

impl BatchEntry {
    pub fn new(source_ref: impl Into<String>, aux_text: Option<String>) -> Self {
        Self {
            source_ref: source_ref.into(),
            aux_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_entry_wire_names() {
        let entry: BatchEntry =
            serde_json::from_str(r#"{"sourceRef":"a.mp3","auxText":"hello"}"#).unwrap();
        assert_eq!(entry.source_ref, "a.mp3");
        assert_eq!(entry.aux_text.as_deref(), Some("hello"));

        let entry: BatchEntry = serde_json::from_str(r#"{"sourceRef":"b.mp3"}"#).unwrap();
        assert!(entry.aux_text.is_none());
    }
}
