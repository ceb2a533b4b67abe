//! Events delivered to transport subscribers
//!
//! Business events carry whatever the server put in `data:`; lifecycle events
//! (`connected`, `disconnected`, `gave_up`) are synthesized by the transport.

use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

/// Channel for events that arrive without an `event:` name
pub const MESSAGE: &str = "message";
/// Channel receiving every event regardless of name
pub const WILDCARD: &str = "*";
/// Lifecycle: stream opened successfully
pub const CONNECTED: &str = "connected";
/// Lifecycle: an attempt failed or the stream ended; a retry is scheduled
pub const DISCONNECTED: &str = "disconnected";
/// Lifecycle: attempt budget exhausted, no retry scheduled
pub const GAVE_UP: &str = "gave_up";

/// Decoded `data:` payload
///
/// Structured when the raw text is valid JSON, raw text otherwise. A payload
/// that fails to decode is never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// Decode raw event data, falling back to the raw string
    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Text(raw.to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Json(_) => None,
        }
    }

    /// Field of a JSON object payload
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_json().and_then(|v| v.get(key))
    }
}

/// The `{event, data}` envelope every handler receives
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamEvent {
    pub event: String,
    pub data: Payload,
}

impl StreamEvent {
    pub fn new(event: impl Into<String>, data: Payload) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Event with a JSON payload
    pub fn json(event: impl Into<String>, data: Value) -> Self {
        Self::new(event, Payload::Json(data))
    }

    /// True for `connected`, `disconnected` and `gave_up`
    pub fn is_lifecycle(&self) -> bool {
        matches!(self.event.as_str(), CONNECTED | DISCONNECTED | GAVE_UP)
    }
}

/// Reason tag carried by `disconnected`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    HttpError,
    NoBody,
    StreamEnded,
    NetworkError,
    /// Tag not produced by this transport version
    Other(String),
}

impl DisconnectReason {
    pub fn as_str(&self) -> &str {
        match self {
            DisconnectReason::HttpError => "http_error",
            DisconnectReason::NoBody => "no_body",
            DisconnectReason::StreamEnded => "stream_ended",
            DisconnectReason::NetworkError => "network_error",
            DisconnectReason::Other(tag) => tag,
        }
    }

    pub fn parse(tag: &str) -> Self {
        match tag {
            "http_error" => DisconnectReason::HttpError,
            "no_body" => DisconnectReason::NoBody,
            "stream_ended" => DisconnectReason::StreamEnded,
            "network_error" => DisconnectReason::NetworkError,
            other => DisconnectReason::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view of the lifecycle channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Connected {
        user_id: String,
    },
    Disconnected {
        reason: DisconnectReason,
        /// Consecutive failures before this one
        attempts: u32,
        /// Delay until the scheduled retry
        retry_in_ms: u64,
        /// HTTP status for `http_error`
        status: Option<u16>,
    },
    GaveUp {
        user_id: String,
        attempts: u32,
    },
}

impl LifecycleEvent {
    /// Envelope published on the lifecycle channel
    pub fn to_stream_event(&self) -> StreamEvent {
        match self {
            LifecycleEvent::Connected { user_id } => {
                StreamEvent::json(CONNECTED, json!({ "userId": user_id }))
            }
            LifecycleEvent::Disconnected {
                reason,
                attempts,
                retry_in_ms,
                status,
            } => {
                let mut data = json!({
                    "reason": reason.as_str(),
                    "attempts": attempts,
                    "retryInMs": retry_in_ms,
                });
                if let (Some(code), Some(map)) = (status, data.as_object_mut()) {
                    map.insert("status".to_string(), json!(code));
                }
                StreamEvent::json(DISCONNECTED, data)
            }
            LifecycleEvent::GaveUp { user_id, attempts } => StreamEvent::json(
                GAVE_UP,
                json!({ "userId": user_id, "attempts": attempts }),
            ),
        }
    }

    /// Recognize a lifecycle envelope; `None` for business events
    pub fn from_stream_event(event: &StreamEvent) -> Option<Self> {
        let str_field = |key: &str| {
            event
                .data
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let u64_field = |key: &str| event.data.get(key).and_then(Value::as_u64);

        match event.event.as_str() {
            CONNECTED => Some(LifecycleEvent::Connected {
                user_id: str_field("userId"),
            }),
            DISCONNECTED => Some(LifecycleEvent::Disconnected {
                reason: DisconnectReason::parse(&str_field("reason")),
                attempts: u64_field("attempts").unwrap_or(0) as u32,
                retry_in_ms: u64_field("retryInMs").unwrap_or(0),
                status: u64_field("status").map(|s| s as u16),
            }),
            GAVE_UP => Some(LifecycleEvent::GaveUp {
                user_id: str_field("userId"),
                attempts: u64_field("attempts").unwrap_or(0) as u32,
            }),
            _ => None,
        }
    }
}
