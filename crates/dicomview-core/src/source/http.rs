//! Remote sources fetched over HTTP(S).
//!
//! The response body is pulled by an async task into a bounded queue of
//! chunks; [`HttpSource`] turns that queue back into a blocking `Read`, so the
//! stream bridge can drain it from its own thread exactly like a file.

use futures_util::StreamExt;
use std::io::{self, Read};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::SourceConfig;
use crate::error::SourceError;

type ChunkRx = mpsc::Receiver<io::Result<Vec<u8>>>;

/// Blocking reader over an HTTP response body.
///
/// Must be read from a thread outside the async runtime (the bridge thread).
pub struct HttpSource {
    rx: ChunkRx,
    front: Vec<u8>,
    front_off: usize,
    content_length: Option<u64>,
}

impl HttpSource {
    fn new(rx: ChunkRx, content_length: Option<u64>) -> Self {
        Self {
            rx,
            front: Vec::new(),
            front_off: 0,
            content_length,
        }
    }

    /// Body length announced by the server, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Block until the next non-empty chunk arrives. `Ok(false)` at end of body.
    fn refill(&mut self) -> io::Result<bool> {
        while self.front_off >= self.front.len() {
            match self.rx.blocking_recv() {
                Some(Ok(chunk)) => {
                    self.front = chunk;
                    self.front_off = 0;
                }
                Some(Err(e)) => return Err(e),
                None => return Ok(false),
            }
        }
        Ok(true)
    }
}

impl Read for HttpSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || !self.refill()? {
            return Ok(0);
        }

        let avail = &self.front[self.front_off..];
        let n = avail.len().min(buf.len());
        buf[..n].copy_from_slice(&avail[..n]);
        self.front_off += n;
        Ok(n)
    }
}

/// Issue a GET for `url` and start streaming its body.
///
/// HTTP-level failures (connection, non-2xx status) are returned here; errors
/// after the body started flowing surface as read errors on the source.
pub async fn open_url(url: &str, config: &SourceConfig) -> Result<HttpSource, SourceError> {
    let http_err = |e: reqwest::Error| SourceError::Http {
        url: url.to_string(),
        status_code: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    };

    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(config.http_connect_timeout_ms))
        .build()
        .map_err(http_err)?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(http_err)?
        .error_for_status()
        .map_err(http_err)?;

    let content_length = response.content_length();
    tracing::debug!("GET {} -> {} ({:?} bytes)", url, response.status(), content_length);

    let (tx, rx) = mpsc::channel(config.http_chunk_queue.max(1));
    let url_owned = url.to_string();
    tokio::spawn(async move {
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let item = chunk.map(|bytes| bytes.to_vec()).map_err(io::Error::other);
            let failed = item.is_err();
            if tx.send(item).await.is_err() {
                // Reader dropped, nobody wants the rest of the body.
                tracing::debug!("Stopped fetching {}: reader released", url_owned);
                return;
            }
            if failed {
                return;
            }
        }
    });

    Ok(HttpSource::new(rx, content_length))
}
