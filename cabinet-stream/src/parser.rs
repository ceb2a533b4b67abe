//! Resumable server-sent-event block parser
//!
//! A pragmatic subset of the SSE grammar:
//! - blocks are terminated by a blank line (`\n\n`, `\r\n` is normalised)
//! - `event:` sets the event name, last one wins
//! - `data:` lines are collected in order and joined with `\n`
//! - a `:` comment line marks the block as a heartbeat
//! - a block with data lines is an event even if it also carries a comment
//! - other fields (`id:`, `retry:`) are ignored
//!
//! Network reads do not align with block boundaries, so [`parse_buffer`]
//! returns the unconsumed tail; callers prepend it to the next chunk.

use crate::events::{Payload, MESSAGE};

/// One fully received block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    /// Value of the last `event:` line, if any
    pub event_name: Option<String>,
    /// `data:` lines joined with `\n` (empty for heartbeats)
    pub raw_data: String,
    /// Comment-only keep-alive block
    pub heartbeat: bool,
}

impl ParsedEvent {
    pub fn is_heartbeat(&self) -> bool {
        self.heartbeat
    }

    /// Channel this event is published on
    pub fn channel(&self) -> &str {
        self.event_name.as_deref().unwrap_or(MESSAGE)
    }

    /// Structured payload when `raw_data` is valid JSON, raw text otherwise
    pub fn decode_payload(&self) -> Payload {
        Payload::decode(&self.raw_data)
    }
}

/// Result of one parse pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutput {
    /// Complete blocks, in wire order
    pub events: Vec<ParsedEvent>,
    /// Trailing text not yet terminated by a blank line
    pub remainder: String,
}

/// Parse every complete block in `buffer`
pub fn parse_buffer(buffer: &str) -> ParseOutput {
    let normalized;
    let text: &str = if buffer.contains('\r') {
        normalized = buffer.replace("\r\n", "\n");
        &normalized
    } else {
        buffer
    };

    let mut events = Vec::new();
    let mut rest = text;

    while let Some(end) = rest.find("\n\n") {
        if let Some(event) = parse_block(&rest[..end]) {
            events.push(event);
        }
        rest = &rest[end + 2..];
    }

    ParseOutput {
        events,
        remainder: rest.to_string(),
    }
}

fn parse_block(block: &str) -> Option<ParsedEvent> {
    let mut event_name: Option<String> = None;
    let mut data_lines: Vec<&str> = Vec::new();
    let mut heartbeat = false;

    for line in block.split('\n') {
        if line.is_empty() {
            continue;
        }
        if line.starts_with(':') {
            heartbeat = true;
            continue;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => {
                let name = value.trim();
                event_name = (!name.is_empty()).then(|| name.to_string());
            }
            "data" => data_lines.push(value),
            _ => {}
        }
    }

    if !data_lines.is_empty() {
        Some(ParsedEvent {
            event_name,
            raw_data: data_lines.join("\n"),
            heartbeat: false,
        })
    } else if heartbeat {
        Some(ParsedEvent {
            event_name: None,
            raw_data: String::new(),
            heartbeat: true,
        })
    } else {
        None
    }
}

/// Incremental UTF-8 decoder for body chunks
///
/// A multi-byte character split across two chunks is held back until its
/// remaining bytes arrive. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct TextDecoder {
    pending: Vec<u8>,
}

impl TextDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `pending + chunk` as forms complete characters
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // Incomplete trailing sequence
                            self.pending.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }
}
