//! Document extraction results.

use serde::{Deserialize, Serialize};

use crate::error::PayloadResult;

/// Plain text extracted from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
}

impl ExtractedDocument {
    pub fn parse(raw: &str) -> PayloadResult<Self> {
        Ok(serde_json::from_str(raw.trim())?)
    }
}
