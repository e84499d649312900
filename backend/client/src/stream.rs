//! Incremental reader over the streamed chat response body.

use std::pin::Pin;

use futures_util::stream::{self, Stream, StreamExt};
use tracing::trace;

use crate::error::ApiError;

type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ApiError>> + Send>>;

/// Handle over a streamed `text/plain` body, yielding decoded text chunks in
/// arrival order.
///
/// Chunk boundaries follow the network reads, except that a UTF-8 character
/// split across two reads is held back until its remaining bytes arrive.
pub struct ChatStream {
    url: String,
    inner: ByteStream,
    pending: Vec<u8>,
    finished: bool,
}

impl ChatStream {
    pub(crate) fn from_response(url: String, response: reqwest::Response) -> Self {
        let source_url = url.clone();
        let inner = response.bytes_stream().map(move |item| {
            item.map(|bytes| bytes.to_vec())
                .map_err(|source| ApiError::Transport {
                    url: source_url.clone(),
                    source,
                })
        });
        Self::new(url, Box::pin(inner))
    }

    /// A stream over in-memory byte chunks, read back one chunk per read.
    pub fn from_chunks<B: Into<Vec<u8>>>(chunks: impl IntoIterator<Item = B>) -> Self {
        let items: Vec<Result<Vec<u8>, ApiError>> =
            chunks.into_iter().map(|chunk| Ok(chunk.into())).collect();
        Self::new("memory://chat".to_string(), Box::pin(stream::iter(items)))
    }

    fn new(url: String, inner: ByteStream) -> Self {
        Self {
            url,
            inner,
            pending: Vec::new(),
            finished: false,
        }
    }

    /// Next decoded chunk, or `None` once the body has ended.
    pub async fn next_chunk(&mut self) -> Result<Option<String>, ApiError> {
        while !self.finished {
            match self.inner.next().await {
                Some(Ok(bytes)) => {
                    self.pending.extend_from_slice(&bytes);
                    let text = self.decode_pending();
                    if !text.is_empty() {
                        trace!(url = %self.url, len = text.len(), "chat chunk");
                        return Ok(Some(text));
                    }
                }
                Some(Err(e)) => return Err(e),
                None => {
                    self.finished = true;
                    if !self.pending.is_empty() {
                        let text = String::from_utf8_lossy(&self.pending).into_owned();
                        self.pending.clear();
                        return Ok(Some(text));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Read the remaining body into one string.
    pub async fn collect_text(&mut self) -> Result<String, ApiError> {
        let mut out = String::new();
        while let Some(chunk) = self.next_chunk().await? {
            out.push_str(&chunk);
        }
        Ok(out)
    }

    /// Decode as much of `pending` as forms complete characters. Invalid
    /// sequences become U+FFFD; an incomplete tail stays buffered.
    fn decode_pending(&mut self) -> String {
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }
        out
    }
}
