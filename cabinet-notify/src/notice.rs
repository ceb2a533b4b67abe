//! Transient notices and the copy rules that build them

use cabinet_common::CabinetRole;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::{self, DEFAULT_MESSAGE};
use crate::payload::NotificationPayload;

/// Icon shown next to a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoticeIcon {
    Alert,
    Status,
    Payment,
    Error,
    Calendar,
    Shield,
    Star,
    Music,
    Message,
    Handshake,
    Info,
    Success,
    Warning,
    #[default]
    Bell,
}

impl NoticeIcon {
    /// Icon for a payload-declared notification `type`
    pub fn from_kind(kind: &str) -> Option<Self> {
        let icon = match kind.to_ascii_lowercase().as_str() {
            "info" => NoticeIcon::Info,
            "success" => NoticeIcon::Success,
            "warning" => NoticeIcon::Warning,
            "error" => NoticeIcon::Error,
            "system" | "alert" => NoticeIcon::Alert,
            "payment" => NoticeIcon::Payment,
            "booking" => NoticeIcon::Calendar,
            "message" | "chat" => NoticeIcon::Message,
            "collaboration" => NoticeIcon::Handshake,
            "moderation" => NoticeIcon::Shield,
            _ => return None,
        };
        Some(icon)
    }
}

/// Audio cue played alongside a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    Success,
    Warning,
    Error,
    Message,
    Notification,
}

impl SoundCue {
    /// Cue for a status-like payload value
    pub fn for_status(status: Option<&str>) -> Self {
        let Some(status) = status else {
            return SoundCue::Notification;
        };
        match status.to_ascii_lowercase().as_str() {
            "completed" | "approved" | "accepted" | "paid" | "success" | "published"
            | "delivered" | "confirmed" => SoundCue::Success,
            "failed" | "rejected" | "declined" | "cancelled" | "canceled" | "error" => {
                SoundCue::Error
            }
            "pending" | "expiring" | "warning" | "in_review" | "revision_requested" => {
                SoundCue::Warning
            }
            _ => SoundCue::Notification,
        }
    }

    pub fn for_payload(payload: &NotificationPayload) -> Self {
        if payload.is_message() {
            SoundCue::Message
        } else {
            Self::for_status(payload.status())
        }
    }
}

/// One transient notice, ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub id: Uuid,
    pub event: String,
    pub icon: NoticeIcon,
    pub title: String,
    pub message: String,
    pub received_at: DateTime<Utc>,
}

impl Notice {
    /// Build the notice for `event_name` as seen by a `role` viewer
    ///
    /// Absent fields fall back to default copy; this never fails.
    pub fn render(event_name: &str, payload: &NotificationPayload, role: CabinetRole) -> Self {
        let (icon, title, message) = match payload {
            NotificationPayload::ChatMessage { sender_name, text, source, .. } => {
                let label = catalog::chat_source_label(source.as_deref());
                let title = match sender_name {
                    Some(sender) => format!("{}: {}", label, sender),
                    None => label.to_string(),
                };
                let message = text
                    .clone()
                    .unwrap_or_else(|| catalog::default_title(event_name).to_string());
                (NoticeIcon::Message, title, message)
            }
            NotificationPayload::DirectMessage { sender_name, text, .. } => {
                let title = sender_name
                    .clone()
                    .unwrap_or_else(|| catalog::default_title(event_name).to_string());
                let message = text.clone().unwrap_or_else(|| DEFAULT_MESSAGE.to_string());
                (NoticeIcon::Message, title, message)
            }
            NotificationPayload::CollaborationOffer { sender_name, title, message } => {
                let from = counterparty(event_name, role, sender_name.as_deref());
                let title = title
                    .clone()
                    .unwrap_or_else(|| format!("Collaboration offer from {}", from));
                let message = message
                    .clone()
                    .unwrap_or_else(|| "Open your cabinet to review the offer".to_string());
                (NoticeIcon::Handshake, title, message)
            }
            NotificationPayload::CollaborationResponse { sender_name, accepted, status, message } => {
                let from = counterparty(event_name, role, sender_name.as_deref());
                let verb = match (accepted, SoundCue::for_status(status.as_deref())) {
                    (Some(true), _) | (None, SoundCue::Success) => "accepted",
                    (Some(false), _) | (None, SoundCue::Error) => "declined",
                    _ => "responded to",
                };
                let title = format!("{} {} your offer", from, verb);
                let message = message.clone().unwrap_or_else(|| DEFAULT_MESSAGE.to_string());
                (NoticeIcon::Handshake, title, message)
            }
            NotificationPayload::Generic { kind, title, message, sender_name, .. } => {
                let icon = catalog::icon_for_event(event_name)
                    .or_else(|| kind.as_deref().and_then(NoticeIcon::from_kind))
                    .unwrap_or_default();
                let title = title
                    .clone()
                    .unwrap_or_else(|| catalog::default_title(event_name).to_string());
                let message = message.clone().unwrap_or_else(|| {
                    if catalog::counterparty_label(event_name, role).is_some() {
                        format!("From {}", counterparty(event_name, role, sender_name.as_deref()))
                    } else {
                        DEFAULT_MESSAGE.to_string()
                    }
                });
                (icon, title, message)
            }
            NotificationPayload::Other(_) => (
                catalog::icon_for_event(event_name).unwrap_or_default(),
                catalog::default_title(event_name).to_string(),
                DEFAULT_MESSAGE.to_string(),
            ),
        };

        Notice {
            id: Uuid::new_v4(),
            event: event_name.to_string(),
            icon,
            title,
            message,
            received_at: Utc::now(),
        }
    }
}

/// "Producer Max", or just "Producer" when the sender is unnamed
fn counterparty(event_name: &str, role: CabinetRole, sender: Option<&str>) -> String {
    let label = catalog::counterparty_label(event_name, role).unwrap_or("Someone");
    match sender {
        Some(name) => format!("{} {}", label, name),
        None => label.to_string(),
    }
}
