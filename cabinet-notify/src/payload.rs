//! Loosely-typed notification payloads
//!
//! Upstream services put whatever fields they like into an event's `data:`.
//! [`PayloadFields`] reads them without ever failing: missing keys, wrong
//! types and non-object payloads all come back as `None`. Numbers and booleans
//! are accepted where a string is expected (ids are sent both ways).

use cabinet_stream::Payload;
use serde_json::{Map, Value};

use crate::catalog;

/// Optional-with-default accessor over a payload object
#[derive(Debug, Clone, Copy)]
pub struct PayloadFields<'a> {
    object: Option<&'a Map<String, Value>>,
}

impl<'a> PayloadFields<'a> {
    pub fn new(object: Option<&'a Map<String, Value>>) -> Self {
        Self { object }
    }

    pub fn from_payload(payload: &'a Payload) -> Self {
        Self::new(payload.as_json().and_then(Value::as_object))
    }

    /// First non-empty string among `keys`, in order
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        let object = self.object?;
        keys.iter().find_map(|key| match object.get(*key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn text_or(&self, keys: &[&str], default: &str) -> String {
        self.text(keys).unwrap_or_else(|| default.to_string())
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.object?.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

const MESSAGE_KEYS: &[&str] = &["message", "text", "body"];
const STATUS_KEYS: &[&str] = &["status", "newStatus"];
const SENDER_KEYS: &[&str] = &["senderName", "fromName", "sender"];

/// Payload of a recognised event, keyed by event name
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationPayload {
    ChatMessage {
        sender_name: Option<String>,
        text: Option<String>,
        source: Option<String>,
        conversation_id: Option<String>,
    },
    CollaborationOffer {
        sender_name: Option<String>,
        title: Option<String>,
        message: Option<String>,
    },
    CollaborationResponse {
        sender_name: Option<String>,
        accepted: Option<bool>,
        status: Option<String>,
        message: Option<String>,
    },
    DirectMessage {
        sender_name: Option<String>,
        text: Option<String>,
        conversation_id: Option<String>,
    },
    Generic {
        kind: Option<String>,
        title: Option<String>,
        message: Option<String>,
        status: Option<String>,
        sender_name: Option<String>,
        notification_id: Option<String>,
        order_id: Option<String>,
    },
    /// Event name outside the catalog; fields kept as received
    Other(Map<String, Value>),
}

impl NotificationPayload {
    /// Interpret `payload` according to `event_name`
    ///
    /// A plain-text payload becomes the message (or chat text) of the event.
    pub fn from_event(event_name: &str, payload: &Payload) -> Self {
        let fields = PayloadFields::from_payload(payload);
        let raw_text = match payload {
            Payload::Text(text) if !text.trim().is_empty() => Some(text.clone()),
            Payload::Json(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
            _ => None,
        };

        match event_name {
            catalog::CHAT_MESSAGE => NotificationPayload::ChatMessage {
                sender_name: fields.text(SENDER_KEYS),
                text: fields.text(&["text", "message", "body"]).or(raw_text),
                source: fields.text(&["source", "channel"]),
                conversation_id: fields.text(&["conversationId"]),
            },
            catalog::COLLABORATION_OFFER => NotificationPayload::CollaborationOffer {
                sender_name: fields.text(SENDER_KEYS),
                title: fields.text(&["title"]),
                message: fields.text(MESSAGE_KEYS).or(raw_text),
            },
            catalog::COLLABORATION_RESPONSE => NotificationPayload::CollaborationResponse {
                sender_name: fields.text(SENDER_KEYS),
                accepted: fields.flag("accepted"),
                status: fields.text(STATUS_KEYS),
                message: fields.text(MESSAGE_KEYS).or(raw_text),
            },
            catalog::DIRECT_MESSAGE => NotificationPayload::DirectMessage {
                sender_name: fields.text(SENDER_KEYS),
                text: fields.text(&["text", "message", "body"]).or(raw_text),
                conversation_id: fields.text(&["conversationId"]),
            },
            name if catalog::is_generic(name) => NotificationPayload::Generic {
                kind: fields.text(&["type"]),
                title: fields.text(&["title"]),
                message: fields.text(MESSAGE_KEYS).or(raw_text),
                status: fields.text(STATUS_KEYS),
                sender_name: fields.text(SENDER_KEYS),
                notification_id: fields.text(&["notificationId", "id"]),
                order_id: fields.text(&["orderId"]),
            },
            _ => NotificationPayload::Other(match payload {
                Payload::Json(Value::Object(map)) => map.clone(),
                _ => Map::new(),
            }),
        }
    }

    /// Status-like field driving the audio cue
    pub fn status(&self) -> Option<&str> {
        match self {
            NotificationPayload::Generic { status, .. }
            | NotificationPayload::CollaborationResponse { status, .. } => status.as_deref(),
            NotificationPayload::Other(map) => STATUS_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str)),
            _ => None,
        }
    }

    pub fn sender_name(&self) -> Option<&str> {
        match self {
            NotificationPayload::ChatMessage { sender_name, .. }
            | NotificationPayload::CollaborationOffer { sender_name, .. }
            | NotificationPayload::CollaborationResponse { sender_name, .. }
            | NotificationPayload::DirectMessage { sender_name, .. }
            | NotificationPayload::Generic { sender_name, .. } => sender_name.as_deref(),
            NotificationPayload::Other(_) => None,
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(
            self,
            NotificationPayload::ChatMessage { .. } | NotificationPayload::DirectMessage { .. }
        )
    }
}
