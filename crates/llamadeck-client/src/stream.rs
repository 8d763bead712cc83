//! Newline-delimited JSON event reader
//!
//! Streaming endpoints answer with one JSON object per line for as long as the
//! operation runs. [`EventReader`] pulls byte chunks off the connection, splits
//! them on line boundaries and decodes one event per line, handing each event
//! to the caller before reading further. Only the current partial line is
//! buffered.
//!
//! Blank lines and lines that fail to decode are skipped: a single corrupt
//! frame must not abort a download that has been running for an hour. The
//! sequence ends when the connection reports end of stream.

use std::marker::PhantomData;

use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{error::ClientError, Result};

/// Lazy, finite, non-restartable reader of line-delimited JSON events
pub struct EventReader<S, T> {
    chunks: S,
    buffer: Vec<u8>,
    cancel: CancellationToken,
    exhausted: bool,
    skipped: usize,
    _event: PhantomData<fn() -> T>,
}

impl<S, B, E, T> EventReader<S, T>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<ClientError>,
    T: DeserializeOwned,
{
    /// Create a reader that is never cancelled
    pub fn new(chunks: S) -> Self {
        Self::with_cancellation(chunks, CancellationToken::new())
    }

    /// Create a reader that stops with [`ClientError::Cancelled`] once `cancel` fires
    pub fn with_cancellation(chunks: S, cancel: CancellationToken) -> Self {
        Self {
            chunks,
            buffer: Vec::new(),
            cancel,
            exhausted: false,
            skipped: 0,
            _event: PhantomData,
        }
    }

    /// Number of non-blank lines skipped because they did not decode
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Next decoded event, `Ok(None)` once the stream has ended.
    ///
    /// Cancellation is checked before every chunk read. A transport error
    /// ends the sequence with that error.
    pub async fn next_event(&mut self) -> Result<Option<T>> {
        loop {
            if let Some(line) = self.take_line() {
                if let Some(event) = self.decode(&line) {
                    return Ok(Some(event));
                }
                continue;
            }

            if self.exhausted {
                // The last line may lack its terminator
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let line = std::mem::take(&mut self.buffer);
                if let Some(event) = self.decode(&line) {
                    return Ok(Some(event));
                }
                return Ok(None);
            }

            if self.cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
                chunk = self.chunks.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => self.buffer.extend_from_slice(bytes.as_ref()),
                Some(Err(e)) => {
                    self.exhausted = true;
                    self.buffer.clear();
                    return Err(e.into());
                }
                None => self.exhausted = true,
            }
        }
    }

    /// Adapt the reader into a `Stream` of events
    pub fn into_stream(self) -> impl Stream<Item = Result<T>> {
        futures::stream::unfold(Some(self), |state| async move {
            let mut reader = state?;
            match reader.next_event().await {
                Ok(Some(event)) => Some((Ok(event), Some(reader))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.buffer.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }

    fn decode(&mut self, line: &[u8]) -> Option<T> {
        if line.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        match serde_json::from_slice::<T>(line) {
            Ok(event) => Some(event),
            Err(e) => {
                self.skipped += 1;
                warn!("Skipping malformed stream line: {}", e);
                debug!("Malformed line content: {}", String::from_utf8_lossy(line));
                None
            }
        }
    }
}
