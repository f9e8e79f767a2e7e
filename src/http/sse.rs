//! Server-Sent Events parsing.
//!
//! [`SseParser`] consumes one line at a time; [`parse_sse_stream`] (whole
//! buffer) and [`SseDecoder`] (raw body bytes as they arrive) both drive it,
//! so batch and streaming input produce identical event sequences.

use std::collections::BTreeMap;

use crate::http::body::ChunkedDecoder;

/// One dispatched event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// `event:` field
    pub event_type: String,
    /// `data:` lines joined with `\n`
    pub data: String,
    /// `id:` field
    pub id: String,
    /// `retry:` field, kept as sent (milliseconds)
    pub retry: String,
    /// Any other field name seen in the event
    pub fields: BTreeMap<String, String>,
}

impl SseEvent {
    /// An event without data, type and id is never delivered.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.event_type.is_empty() && self.id.is_empty()
    }

    /// Renders the event back into SSE wire text, terminated by a blank line.
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        if !self.event_type.is_empty() {
            out.push_str(&format!("event: {}\n", self.event_type));
        }
        if !self.id.is_empty() {
            out.push_str(&format!("id: {}\n", self.id));
        }
        if !self.retry.is_empty() {
            out.push_str(&format!("retry: {}\n", self.retry));
        }
        if !self.data.is_empty() {
            for line in self.data.split('\n') {
                out.push_str(&format!("data: {line}\n"));
            }
        }
        out.push('\n');
        out
    }
}

/// Line-oriented event assembler.
#[derive(Debug, Default)]
pub struct SseParser {
    current: SseEvent,
    data_lines: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes one line (without its `\n`); returns an event when the line
    /// is a blank boundary closing a non-empty event.
    pub fn feed_line(&mut self, line: &str) -> Option<SseEvent> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            return self.dispatch();
        }

        // Comment
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.current.event_type = value.to_string(),
            "data" => self.data_lines.push(value.to_string()),
            "id" => self.current.id = value.to_string(),
            "retry" => self.current.retry = value.to_string(),
            other => {
                self.current.fields.insert(other.to_string(), value.to_string());
            }
        }

        None
    }

    /// Flushes a pending event at end of stream.
    pub fn finish(&mut self) -> Option<SseEvent> {
        self.dispatch()
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let mut event = std::mem::take(&mut self.current);
        event.data = std::mem::take(&mut self.data_lines).join("\n");

        if event.is_empty() { None } else { Some(event) }
    }
}

/// Parses a complete SSE payload.
///
/// # Example
///
/// ```
/// # use httpline::http::sse::parse_sse_stream;
/// let events = parse_sse_stream("event: update\ndata: a\ndata: b\nid: 1\n\n");
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].data, "a\nb");
/// ```
pub fn parse_sse_stream(input: &str) -> Vec<SseEvent> {
    let mut parser = SseParser::new();
    // Split on LF only; `feed_line` owns the single trailing CR strip
    let mut events: Vec<SseEvent> = input.split('\n').filter_map(|line| parser.feed_line(line)).collect();
    events.extend(parser.finish());
    events
}

/// Turns raw response body bytes into events as they arrive.
///
/// Handles an optional chunked transfer coding and lines split across reads.
#[derive(Debug)]
pub struct SseDecoder {
    chunked: Option<ChunkedDecoder>,
    pending: Vec<u8>,
    parser: SseParser,
}

impl SseDecoder {
    pub fn new(chunked: bool) -> Self {
        Self {
            chunked: chunked.then(ChunkedDecoder::new),
            pending: Vec::new(),
            parser: SseParser::new(),
        }
    }

    /// Feeds body bytes and returns the events completed by them, in order.
    pub fn push(&mut self, data: &[u8]) -> Vec<SseEvent> {
        match self.chunked.as_mut() {
            Some(decoder) => decoder.decode(data, &mut self.pending),
            None => self.pending.extend_from_slice(data),
        }

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos;
            let line = String::from_utf8_lossy(&self.pending[start..end]);
            events.extend(self.parser.feed_line(&line));
            start = end + 1;
        }
        self.pending.drain(..start);

        events
    }

    /// True when a chunked body has reached its terminal chunk.
    pub fn is_complete(&self) -> bool {
        self.chunked.as_ref().is_some_and(ChunkedDecoder::is_done)
    }

    /// Flushes a trailing unterminated line and any pending event.
    pub fn finish(mut self) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if !self.pending.is_empty() {
            let line = String::from_utf8_lossy(&self.pending).into_owned();
            events.extend(self.parser.feed_line(&line));
        }
        events.extend(self.parser.finish());
        events
    }
}
