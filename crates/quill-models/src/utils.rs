//! Small helpers shared across crates.

use url::Url;

/// Check whether `s` is an absolute http(s) URL with a host.
pub fn is_http_url(s: &str) -> bool {
    match Url::parse(s.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Truncate `text` to at most `max_bytes` on a char boundary, noting how
/// much was dropped. Used to keep raw worker output in error details
/// without letting it grow unbounded.
pub fn truncate_for_detail(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!(
        "{}... [truncated {} bytes]",
        &text[..cut],
        text.len() - cut
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://example.com/a.pdf"));
        assert!(is_http_url("http://localhost:8080/a.mp3"));
        assert!(!is_http_url("ftp://example.com/a.pdf"));
        assert!(!is_http_url("just some reference text"));
        assert!(!is_http_url("file:///etc/passwd"));
    }

    #[test]
    fn test_truncate_for_detail() {
        assert_eq!(truncate_for_detail("short", 10), "short");

        let out = truncate_for_detail("abcdefghij", 4);
        assert_eq!(out, "abcd... [truncated 6 bytes]");

        // 'é' is two bytes; cutting at 1 must back off to 0
        let out = truncate_for_detail("éa", 1);
        assert!(out.starts_with("... [truncated"));
    }
}
