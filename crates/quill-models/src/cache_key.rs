//! Cache key derivation.
//!
//! A cache key is the SHA-256 of a source reference, hex encoded. The same
//! key addresses both the artifact store and the job registry.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::PayloadError;

/// Length of a hex-encoded SHA-256 digest.
pub const CACHE_KEY_LEN: usize = 64;

/// Opaque, fixed-length key derived from a source reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the cache key for a source reference.
    ///
    /// The reference is hashed verbatim, so callers that want two spellings
    /// of a URL to share a key must normalise before calling.
    pub fn derive(source_ref: &str) -> Self {
        let digest = Sha256::digest(source_ref.as_bytes());
        Self(format!("{:x}", digest))
    }

    /// Parse a key received from a client.
    ///
    /// Accepts exactly 64 lowercase hex characters.
    pub fn parse(s: &str) -> Result<Self, PayloadError> {
        if s.len() != CACHE_KEY_LEN {
            return Err(PayloadError::invalid(format!(
                "cache key must be {} characters, got {}",
                CACHE_KEY_LEN,
                s.len()
            )));
        }
        if !s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')) {
            return Err(PayloadError::invalid(
                "cache key must be lowercase hexadecimal",
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_derive_is_deterministic() {
        let a = CacheKey::derive("https://cdn.example.com/a.mp3");
        let b = CacheKey::derive("https://cdn.example.com/a.mp3");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), CACHE_KEY_LEN);
    }

    #[test]
    fn test_derive_known_vector() {
        // sha256("abc")
        let key = CacheKey::derive("abc");
        assert_eq!(
            key.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_derive_distinct_over_large_sample() {
        let keys: HashSet<CacheKey> = (0..10_000)
            .map(|i| CacheKey::derive(&format!("https://cdn.example.com/{}.mp3", i)))
            .collect();
        assert_eq!(keys.len(), 10_000);
    }

    #[test]
    fn test_derive_is_sensitive_to_whitespace() {
        assert_ne!(CacheKey::derive("a.mp3"), CacheKey::derive("a.mp3 "));
    }

    #[test]
    fn test_parse_roundtrips_derived_key() {
        let key = CacheKey::derive("doc.pdf");
        let parsed = CacheKey::parse(key.as_str()).unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(CacheKey::parse("").is_err());
        assert!(CacheKey::parse("abc").is_err());
        assert!(CacheKey::parse(&"G".repeat(64)).is_err());
        assert!(CacheKey::parse(&"A".repeat(64)).is_err());
        assert!(CacheKey::parse("../../etc/passwd").is_err());
    }
}
