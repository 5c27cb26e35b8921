//! Streaming support for LLM responses

use super::LlmError;
use crate::utils::http::map_transport_error;
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

/// Represents a chunk of streaming response data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// The incremental content for this chunk
    pub content: Option<String>,
    /// Set on the terminal chunk only
    pub finish_reason: Option<String>,
}

impl StreamChunk {
    /// Create a new content chunk
    pub fn content<S: Into<String>>(content: S) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: None,
        }
    }

    /// Create the terminal chunk
    pub fn finish<S: Into<String>>(finish_reason: S) -> Self {
        Self {
            content: None,
            finish_reason: Some(finish_reason.into()),
        }
    }

    /// Check if this is the final chunk
    pub fn is_final(&self) -> bool {
        self.finish_reason.is_some()
    }
}

/// Stream of chunks from an LLM response
pub type LlmStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, LlmError>> + Send>>;

/// Server-Sent Events (SSE) parser for streaming responses
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    undecoded: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; multi-byte characters split across reads are kept
    /// until their remaining bytes arrive
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.undecoded.extend_from_slice(bytes);
        let valid_up_to = match std::str::from_utf8(&self.undecoded) {
            Ok(text) => text.len(),
            Err(e) => e.valid_up_to(),
        };
        let decoded: Vec<u8> = self.undecoded.drain(..valid_up_to).collect();
        // The drained prefix was validated above
        let text = String::from_utf8_lossy(&decoded).into_owned();
        self.parse(&text)
    }

    /// Parse incoming data and extract complete SSE events
    pub fn parse(&mut self, data: &str) -> Vec<SseEvent> {
        self.buffer.push_str(&data.replace("\r\n", "\n"));
        let mut events = Vec::new();

        while let Some(event_end) = self.buffer.find("\n\n") {
            let event_data = self.buffer[..event_end].to_string();
            self.buffer.drain(..event_end + 2);

            if let Some(event) = Self::parse_event(&event_data) {
                events.push(event);
            }
        }

        events
    }

    /// Flush a trailing event that was not followed by a blank line
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        Self::parse_event(&rest)
    }

    fn parse_event(data: &str) -> Option<SseEvent> {
        let mut event_type = None;
        let mut event_data = String::new();

        for line in data.lines() {
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            if let Some(colon_pos) = line.find(':') {
                let field = &line[..colon_pos];
                let value = line[colon_pos + 1..].trim_start();

                match field {
                    "event" => event_type = Some(value.to_string()),
                    "data" => {
                        if !event_data.is_empty() {
                            event_data.push('\n');
                        }
                        event_data.push_str(value);
                    }
                    _ => {}
                }
            }
        }

        if event_data.is_empty() {
            None
        } else {
            Some(SseEvent {
                event_type,
                data: event_data,
            })
        }
    }
}

/// Represents a Server-Sent Event
#[derive(Debug, Clone)]
pub struct SseEvent {
    pub event_type: Option<String>,
    pub data: String,
}

impl SseEvent {
    /// Check for the explicit end-of-stream sentinel
    pub fn is_done(&self) -> bool {
        self.event_type.as_deref() == Some("done") || self.data.trim() == "[DONE]"
    }
}

struct SseState<S, F> {
    body: Pin<Box<S>>,
    parser: SseParser,
    decode: F,
    pending: VecDeque<Result<StreamChunk, LlmError>>,
    finished: bool,
    end_is_completion: bool,
    timeout: Duration,
}

impl<S, F> SseState<S, F>
where
    F: FnMut(&SseEvent) -> Result<Vec<StreamChunk>, LlmError>,
{
    fn handle_events(&mut self, events: Vec<SseEvent>) {
        for event in events {
            if self.finished {
                return;
            }
            if event.is_done() {
                self.pending.push_back(Ok(StreamChunk::finish("stop")));
                self.finished = true;
                return;
            }
            match (self.decode)(&event) {
                Ok(chunks) => {
                    for chunk in chunks {
                        let is_final = chunk.is_final();
                        self.pending.push_back(Ok(chunk));
                        if is_final {
                            self.finished = true;
                            break;
                        }
                    }
                }
                Err(e) => {
                    self.pending.push_back(Err(e));
                    self.finished = true;
                }
            }
        }
    }
}

/// Adapt an SSE response body into an [`LlmStream`].
///
/// `decode` turns one event into zero or more chunks; a chunk with a finish
/// reason or a `[DONE]` event ends the stream. When the body ends without
/// either, the stream ends with a final chunk if `end_is_completion` is set
/// and with an error otherwise. The body is owned by the returned stream.
pub fn sse_stream<S, B, F>(body: S, decode: F, end_is_completion: bool, timeout: Duration) -> LlmStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    F: FnMut(&SseEvent) -> Result<Vec<StreamChunk>, LlmError> + Send + 'static,
{
    let state = SseState {
        body: Box::pin(body),
        parser: SseParser::new(),
        decode,
        pending: VecDeque::new(),
        finished: false,
        end_is_completion,
        timeout,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let events = state.parser.push_bytes(bytes.as_ref());
                    state.handle_events(events);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    let error = map_transport_error(e, state.timeout);
                    return Some((Err(error), state));
                }
                None => {
                    if let Some(event) = state.parser.finish() {
                        state.handle_events(vec![event]);
                    }
                    if !state.finished {
                        state.finished = true;
                        if state.end_is_completion {
                            state.pending.push_back(Ok(StreamChunk::finish("stop")));
                        } else {
                            state.pending.push_back(Err(LlmError::InvalidResponse {
                                message: "Stream ended without completion marker".to_string(),
                            }));
                        }
                    }
                }
            }
        }
    }))
}
