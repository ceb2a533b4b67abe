//! Server-Sent Events (SSE) wire frames
//!
//! Encodes events in the text format the notification stream speaks:
//!
//! ```text
//! event: <name>
//! data: <line 1>
//! data: <line 2>
//!
//! ```
//!
//! A heartbeat is a comment-only frame (`: keep-alive`).
//!
//! The client side parses frames in `cabinet-stream`; this encoder is the
//! server half, used by the in-process endpoints the integration tests and
//! local mock servers run against.

use serde::Serialize;

/// One frame ready for transmission on an event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// Named or unnamed event carrying a data payload
    Event {
        /// Event name (`None` → generic `message` channel on the receiver)
        event: Option<String>,
        /// Payload; embedded newlines become separate `data:` lines
        data: String,
    },
    /// Comment-only keep-alive frame
    Heartbeat(String),
}

impl SseFrame {
    /// Named event with a text payload
    pub fn named(event: &str, data: impl Into<String>) -> Self {
        SseFrame::Event {
            event: Some(event.to_string()),
            data: data.into(),
        }
    }

    /// Unnamed event (delivered on the `message` channel)
    pub fn message(data: impl Into<String>) -> Self {
        SseFrame::Event {
            event: None,
            data: data.into(),
        }
    }

    /// Named event with a JSON-serialized payload
    pub fn json<T: Serialize>(event: &str, payload: &T) -> serde_json::Result<Self> {
        Ok(SseFrame::named(event, serde_json::to_string(payload)?))
    }

    /// Keep-alive comment frame
    pub fn heartbeat(comment: &str) -> Self {
        SseFrame::Heartbeat(comment.to_string())
    }

    /// Format as SSE protocol string, including the terminating blank line
    pub fn to_wire(&self) -> String {
        let mut output = String::new();

        match self {
            SseFrame::Event { event, data } => {
                if let Some(name) = event {
                    output.push_str(&format!("event: {}\n", name));
                }
                for line in data.split('\n') {
                    output.push_str(&format!("data: {}\n", line));
                }
            }
            SseFrame::Heartbeat(comment) => {
                output.push_str(&format!(": {}\n", comment));
            }
        }

        output.push('\n');
        output
    }
}
