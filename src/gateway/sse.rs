//! Incremental decoder for `text/event-stream` completion bodies.
//!
//! Only `data:` lines matter. Each carries either a JSON chunk or the `[DONE]`
//! sentinel. Bytes may arrive split at arbitrary points, so the decoder buffers until
//! a full line is available.

use serde_json::error::Category;
use tracing::debug;

use super::types::StreamChunk;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseEvent {
    /// Non-empty content fragment.
    Delta(String),
    /// Upstream signalled the end of the stream.
    Done,
    /// Valid JSON that does not look like a completion chunk.
    Malformed(String),
}

#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` and returns events for every line completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            decode_line(&line, &mut events);
        }
        events
    }

    /// Flushes a trailing line that had no newline.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            decode_line(&line, &mut events);
        }
        events
    }
}

fn decode_line(raw: &[u8], events: &mut Vec<SseEvent>) {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\r', '\n']);

    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return;
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return;
    }
    if payload == DONE_SENTINEL {
        events.push(SseEvent::Done);
        return;
    }

    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => {
            for choice in chunk.choices {
                if let Some(content) = choice.delta.content
                    && !content.is_empty()
                {
                    events.push(SseEvent::Delta(content));
                }
            }
        }
        Err(err) if err.classify() == Category::Data => {
            events.push(SseEvent::Malformed(err.to_string()));
        }
        Err(err) => {
            debug!(error = %err, "Skipping undecodable stream line");
        }
    }
}
