//! Server-Sent Events transport over reqwest

use futures_util::StreamExt;
use tokio::sync::mpsc;
use url::Url;

use super::{SourceEvent, StreamSource, Subscription, DEFAULT_CHANNEL_CAPACITY};

/// Query parameter carrying the job link on the download endpoint.
const LINK_PARAM: &str = "spotify_link";

/// Longest line kept from the stream; the rest of an oversized line is dropped.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

const BOM: &[u8] = "\u{FEFF}".as_bytes();

/// Incremental `text/event-stream` decoder.
///
/// Bytes go in as they arrive; every complete event's `data` comes out as
/// one line. Only the `data` field is meaningful to the monitor; comments
/// and other fields are skipped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    /// Bytes of `buf` already known to hold no newline.
    scanned: usize,
    /// Past the optional byte order mark at the start of the stream.
    started: bool,
    /// Dropping input until the end of an oversized line.
    overflowed: bool,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, mut chunk: &[u8]) -> Vec<String> {
        let mut out = Vec::new();

        if self.overflowed {
            match chunk.iter().position(|b| *b == b'\n') {
                Some(newline) => {
                    chunk = &chunk[newline..];
                    self.overflowed = false;
                }
                None => return out,
            }
        }
        self.buf.extend_from_slice(chunk);

        if !self.started {
            if self.buf.len() < BOM.len() && BOM.starts_with(&self.buf) {
                return out;
            }
            if self.buf.starts_with(BOM) {
                self.buf.drain(..BOM.len());
            }
            self.started = true;
        }

        while let Some(offset) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
            let newline = self.scanned + offset;
            let mut line: Vec<u8> = self.buf.drain(..=newline).collect();
            self.scanned = 0;
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if let Some(event) = self.process_line(&String::from_utf8_lossy(&line)) {
                out.push(event);
            }
        }
        self.scanned = self.buf.len();

        if self.buf.len() > MAX_LINE_BYTES {
            tracing::warn!(
                limit = MAX_LINE_BYTES,
                "stream line too long, truncating"
            );
            self.buf.truncate(MAX_LINE_BYTES);
            self.scanned = MAX_LINE_BYTES;
            self.overflowed = true;
        }

        out
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            return Some(std::mem::take(&mut self.data).join("\n"));
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }
}

/// Subscribes to `{server}/download?spotify_link=<link>`.
#[derive(Clone)]
pub struct SseSource {
    client: reqwest::Client,
    server: Url,
}

impl SseSource {
    pub fn new(client: reqwest::Client, server: Url) -> Self {
        Self { client, server }
    }

    pub fn stream_url(&self, link: &str) -> Url {
        let mut url = self.server.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("download");
        }
        url.query_pairs_mut().clear().append_pair(LINK_PARAM, link);
        url
    }
}

impl StreamSource for SseSource {
    fn subscribe(&self, link: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let url = self.stream_url(link);
        let client = self.client.clone();

        tracing::info!(%url, "subscribing to job stream");
        let task = tokio::spawn(async move {
            let reason = relay(client, url, &tx).await;
            let _ = tx.send(SourceEvent::Disconnected { reason }).await;
        });

        Subscription::new(rx, task)
    }
}

/// Forward decoded lines until the stream ends. Returns the failure, if any.
async fn relay(
    client: reqwest::Client,
    url: Url,
    tx: &mpsc::Sender<SourceEvent>,
) -> Option<String> {
    let response = match client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => return Some(format!("stream request failed: {}", e)),
    };

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Some(format!("stream failed with status {}: {}", status, body.trim()));
    }

    let mut decoder = SseDecoder::new();
    let mut bytes = response.bytes_stream();
    while let Some(chunk) = bytes.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => return Some(format!("stream read failed: {}", e)),
        };
        for line in decoder.feed(&chunk) {
            tracing::trace!(%line, "stream line");
            if tx.send(SourceEvent::Line(line)).await.is_err() {
                // Subscription closed on our side.
                return None;
            }
        }
    }

    None
}
