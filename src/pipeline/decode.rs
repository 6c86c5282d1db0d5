//! Streaming decoder (Bytes -> [`StreamChunk`])
//!
//! The backend streams one JSON object per line (NDJSON). Lines are buffered across
//! arbitrary byte boundaries; each complete line becomes at most one chunk.

use crate::types::wire::GenerateResponse;
use crate::types::StreamChunk;
use crate::{BoxStream, Error};
use bytes::Bytes;
use futures::{stream, StreamExt};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Longest slice of a malformed line that is copied into the warning.
const MAX_LOGGED_LINE_CHARS: usize = 120;

/// NDJSON decoder for generation streams.
///
/// - malformed or non-conforming lines are skipped with a warning
/// - a line with `done: true` is yielded and ends the stream
/// - a transport error is yielded once and ends the stream
/// - cancellation and the idle timeout are checked before every read
#[derive(Debug, Clone)]
pub struct NdjsonDecoder {
    cancel: CancellationToken,
    idle_timeout: Option<Duration>,
}

impl NdjsonDecoder {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            idle_timeout: None,
        }
    }

    /// Fail the stream when no bytes arrive for `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    pub fn decode_stream(self, input: BoxStream<'static, Bytes>) -> BoxStream<'static, StreamChunk> {
        let state = DecodeState {
            input,
            buf: Vec::new(),
            next_index: 0,
            eof: false,
            finished: false,
            cancel: self.cancel,
            idle_timeout: self.idle_timeout,
        };

        let stream = stream::unfold(state, |mut st| async move {
            if st.finished {
                return None;
            }
            loop {
                if let Some(pos) = st.buf.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = st.buf.drain(..=pos).collect();
                    if let Some(chunk) = st.decode_line(&line[..pos]) {
                        return Some((Ok(chunk), st));
                    }
                    continue;
                }

                if st.eof {
                    // A final line may arrive without a trailing newline.
                    let rest = std::mem::take(&mut st.buf);
                    st.finished = true;
                    return st.decode_line(&rest).map(|chunk| (Ok(chunk), st));
                }

                let cancel = st.cancel.clone();
                let idle_timeout = st.idle_timeout;
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => ReadOutcome::Cancelled,
                    next = read_next(&mut st.input, idle_timeout) => next,
                };

                match next {
                    ReadOutcome::Bytes(bytes) => st.buf.extend_from_slice(&bytes),
                    ReadOutcome::Eof => st.eof = true,
                    ReadOutcome::Cancelled => {
                        debug!("stream cancelled by caller");
                        st.finished = true;
                        return Some((Err(Error::cancelled()), st));
                    }
                    ReadOutcome::Failed(e) => {
                        st.finished = true;
                        return Some((Err(e), st));
                    }
                }
            }
        });

        Box::pin(stream)
    }
}

struct DecodeState {
    input: BoxStream<'static, Bytes>,
    buf: Vec<u8>,
    next_index: usize,
    eof: bool,
    finished: bool,
    cancel: CancellationToken,
    idle_timeout: Option<Duration>,
}

impl DecodeState {
    fn decode_line(&mut self, raw: &[u8]) -> Option<StreamChunk> {
        let line = trim_ascii(raw);
        if line.is_empty() {
            return None;
        }

        // Parsing the raw bytes rejects invalid UTF-8 instead of substituting U+FFFD.
        match serde_json::from_slice::<GenerateResponse>(line) {
            Ok(parsed) => {
                let chunk = StreamChunk {
                    text: parsed.response,
                    index: self.next_index,
                    done: parsed.done,
                };
                self.next_index += 1;
                if chunk.done {
                    self.finished = true;
                }
                Some(chunk)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    line = %preview(line),
                    "skipping malformed stream line"
                );
                None
            }
        }
    }
}

enum ReadOutcome {
    Bytes(Bytes),
    Eof,
    Cancelled,
    Failed(Error),
}

async fn read_next(input: &mut BoxStream<'static, Bytes>, idle_timeout: Option<Duration>) -> ReadOutcome {
    let next = match idle_timeout {
        Some(limit) => match tokio::time::timeout(limit, input.next()).await {
            Ok(next) => next,
            Err(_) => return ReadOutcome::Failed(Error::timed_out(limit)),
        },
        None => input.next().await,
    };
    match next {
        Some(Ok(bytes)) => ReadOutcome::Bytes(bytes),
        Some(Err(e)) => ReadOutcome::Failed(e),
        None => ReadOutcome::Eof,
    }
}

fn trim_ascii(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if !first.is_ascii_whitespace() {
            break;
        }
        bytes = rest;
    }
    while let [rest @ .., last] = bytes {
        if !last.is_ascii_whitespace() {
            break;
        }
        bytes = rest;
    }
    bytes
}

fn preview(line: &[u8]) -> String {
    let line = String::from_utf8_lossy(line);
    match line.char_indices().nth(MAX_LOGGED_LINE_CHARS) {
        Some((idx, _)) => format!("{}...", &line[..idx]),
        None => line.into_owned(),
    }
}
