use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use reqwest::{Client, Response, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::ReadAt;

const MAX_RETRY: u32 = 10;

/// Package served over HTTP(S), read with Range requests.
///
/// Only the central directory and the JSON entries are ever fetched, so
/// images and previews in large packages cost nothing.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
}

impl HttpRangeReader {
    /// Probe the server with a one-byte range request.
    ///
    /// The total size comes from `Content-Range`; servers that answer the
    /// probe with a full body do not support ranges and are rejected.
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let mut reader = Self {
            client,
            url,
            size: 0,
            transferred_bytes: AtomicU64::new(0),
        };

        let resp = reader.send_range("bytes=0-0").await?;
        reader.size = match resp.status() {
            StatusCode::PARTIAL_CONTENT => resp
                .headers()
                .get(CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(total_from_content_range)
                .ok_or_else(|| anyhow!("{} sent no usable Content-Range", reader.url))?,
            StatusCode::RANGE_NOT_SATISFIABLE => reader.size_from_head().await?,
            StatusCode::OK => bail!("{} does not support Range requests", reader.url),
            status => bail!("HTTP request failed with status: {}", status),
        };

        debug!(url = %reader.url, size = reader.size, "opened remote package");
        Ok(reader)
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// Empty files reject every range; HEAD still reports their length.
    async fn size_from_head(&self) -> Result<u64> {
        let resp = self.client.head(&self.url).send().await?;
        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }
        resp.headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| anyhow!("{} did not return Content-Length", self.url))
    }

    /// Send one range request, retrying on timeouts and connection failures.
    async fn send_range(&self, range: &str) -> Result<Response> {
        let mut retry = 0;
        loop {
            match self.client.get(&self.url).header(RANGE, range).send().await {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry += 1;
                    if retry >= MAX_RETRY {
                        return Err(e).with_context(|| format!("max retries exceeded fetching {}", range));
                    }
                    warn!(retry, max = MAX_RETRY, error = %e, "connection error, retrying range request");
                    tokio::time::sleep(Duration::from_millis(500 * retry as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let end = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let wanted = (end - offset + 1) as usize;
        let mut received = 0;

        // Servers may return a shorter range than asked for.
        while received < wanted {
            let range = format!("bytes={}-{}", offset + received as u64, end);
            let resp = self.send_range(&range).await?;
            if resp.status() != StatusCode::PARTIAL_CONTENT {
                bail!("HTTP request failed with status: {}", resp.status());
            }

            let bytes = resp.bytes().await?;
            if bytes.is_empty() {
                bail!("server returned an empty body for {}", range);
            }
            let chunk = bytes.len().min(wanted - received);
            buf[received..received + chunk].copy_from_slice(&bytes[..chunk]);
            received += chunk;
            self.transferred_bytes.fetch_add(chunk as u64, Ordering::Relaxed);
        }

        Ok(received)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// Total length from a `Content-Range: bytes <start>-<end>/<total>` header.
fn total_from_content_range(value: &str) -> Option<u64> {
    let (unit, rest) = value.trim().split_once(' ')?;
    if !unit.eq_ignore_ascii_case("bytes") {
        return None;
    }
    let (_, total) = rest.split_once('/')?;
    total.trim().parse().ok()
}
