//! Source asset download over HTTP.
//!
//! Every fetch is bounded twice: by the client's request timeout, which
//! covers connect through the last body byte, and by a byte cap checked
//! against `Content-Length` up front and against the running total while
//! streaming.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Url};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{MediaError, MediaResult};

/// Bounded HTTP fetcher for source assets.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    max_bytes: u64,
}

impl Downloader {
    pub fn new(timeout: Duration, max_bytes: u64) -> MediaResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MediaError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, max_bytes })
    }

    /// Stream `url` into the file at `dest`, returning the number of bytes written.
    pub async fn fetch_to_file(&self, url: &str, dest: &Path) -> MediaResult<u64> {
        let mut response = self.start(url).await?;
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            written += chunk.len() as u64;
            self.check_size(written)?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        info!(url = %url, path = %dest.display(), bytes = written, "Downloaded source");
        Ok(written)
    }

    async fn start(&self, url: &str) -> MediaResult<reqwest::Response> {
        let parsed = parse_source_url(url)?;
        let response = self.client.get(parsed).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::download_failed(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        if let Some(len) = response.content_length() {
            self.check_size(len)?;
        }
        Ok(response)
    }

    fn check_size(&self, size: u64) -> MediaResult<()> {
        if size > self.max_bytes {
            return Err(MediaError::DownloadTooLarge {
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

fn parse_source_url(source: &str) -> MediaResult<Url> {
    let url = Url::parse(source.trim())
        .map_err(|_| MediaError::UnsupportedSource(source.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(MediaError::UnsupportedSource(source.to_string())),
    }
}

/// Local file name for a downloaded source, keeping a short alphanumeric
/// extension from the URL path so the worker can sniff the format.
pub fn source_file_name(source: &str) -> String {
    let ext = Url::parse(source.trim()).ok().and_then(|url| {
        let last = url.path_segments()?.last()?.to_string();
        let (_, ext) = last.rsplit_once('.')?;
        let ok = !ext.is_empty()
            && ext.len() <= 8
            && ext.chars().all(|c| c.is_ascii_alphanumeric());
        ok.then(|| ext.to_ascii_lowercase())
    });

    match ext {
        Some(ext) => format!("source.{}", ext),
        None => "source".to_string(),
    }
}
