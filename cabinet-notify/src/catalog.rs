//! Recognised notification event names and their lookup tables
//!
//! Three name sets:
//! - [`GENERIC_EVENTS`]: share one notice handler (icon/title/message lookup)
//! - [`SHAPED_EVENTS`]: bespoke field extraction (messages, collaborations)
//! - [`COUNTABLE_EVENTS`]: bump the unread badge; a superset of the first two

use cabinet_common::CabinetRole;

use crate::notice::NoticeIcon;

pub const SYSTEM_ALERT: &str = "system_alert";
pub const STATUS_CHANGED: &str = "status_changed";
pub const ORDER_STATUS_CHANGED: &str = "order_status_changed";
pub const PAYMENT_RECEIVED: &str = "payment_received";
pub const PAYMENT_FAILED: &str = "payment_failed";
pub const BOOKING_REQUEST: &str = "booking_request";
pub const BOOKING_UPDATED: &str = "booking_updated";
pub const MODERATION_RESULT: &str = "moderation_result";
pub const SUBSCRIPTION_CHANGED: &str = "subscription_changed";
pub const SUBSCRIPTION_EXPIRING: &str = "subscription_expiring";
pub const CONTENT_PUBLISHED: &str = "content_published";
pub const NEW_NOTIFICATION: &str = "new_notification";

pub const CHAT_MESSAGE: &str = "chat_message";
pub const COLLABORATION_OFFER: &str = "collaboration_offer";
pub const COLLABORATION_RESPONSE: &str = "collaboration_response";
pub const DIRECT_MESSAGE: &str = "direct_message";

pub const NEW_FOLLOWER: &str = "new_follower";
pub const REVIEW_RECEIVED: &str = "review_received";
pub const CONVERSATION_UPDATED: &str = "conversation_updated";

/// Events rendered by the shared notice handler
pub const GENERIC_EVENTS: &[&str] = &[
    SYSTEM_ALERT,
    STATUS_CHANGED,
    ORDER_STATUS_CHANGED,
    PAYMENT_RECEIVED,
    PAYMENT_FAILED,
    BOOKING_REQUEST,
    BOOKING_UPDATED,
    MODERATION_RESULT,
    SUBSCRIPTION_CHANGED,
    SUBSCRIPTION_EXPIRING,
    CONTENT_PUBLISHED,
    NEW_NOTIFICATION,
];

/// Events with a bespoke payload shape
pub const SHAPED_EVENTS: &[&str] = &[
    CHAT_MESSAGE,
    COLLABORATION_OFFER,
    COLLABORATION_RESPONSE,
    DIRECT_MESSAGE,
];

/// Events that bump the unread badge
pub const COUNTABLE_EVENTS: &[&str] = &[
    SYSTEM_ALERT,
    STATUS_CHANGED,
    ORDER_STATUS_CHANGED,
    PAYMENT_RECEIVED,
    PAYMENT_FAILED,
    BOOKING_REQUEST,
    BOOKING_UPDATED,
    MODERATION_RESULT,
    SUBSCRIPTION_CHANGED,
    SUBSCRIPTION_EXPIRING,
    CONTENT_PUBLISHED,
    NEW_NOTIFICATION,
    CHAT_MESSAGE,
    COLLABORATION_OFFER,
    COLLABORATION_RESPONSE,
    DIRECT_MESSAGE,
    NEW_FOLLOWER,
    REVIEW_RECEIVED,
    CONVERSATION_UPDATED,
];

pub fn is_generic(event_name: &str) -> bool {
    GENERIC_EVENTS.contains(&event_name)
}

pub fn is_countable(event_name: &str) -> bool {
    COUNTABLE_EVENTS.contains(&event_name)
}

/// Icon registered for an event name
///
/// `new_notification` is deliberately absent: its icon comes from the
/// payload's declared `type`.
pub fn icon_for_event(event_name: &str) -> Option<NoticeIcon> {
    let icon = match event_name {
        SYSTEM_ALERT => NoticeIcon::Alert,
        STATUS_CHANGED | ORDER_STATUS_CHANGED => NoticeIcon::Status,
        PAYMENT_RECEIVED => NoticeIcon::Payment,
        PAYMENT_FAILED => NoticeIcon::Error,
        BOOKING_REQUEST | BOOKING_UPDATED => NoticeIcon::Calendar,
        MODERATION_RESULT => NoticeIcon::Shield,
        SUBSCRIPTION_CHANGED | SUBSCRIPTION_EXPIRING => NoticeIcon::Star,
        CONTENT_PUBLISHED => NoticeIcon::Music,
        CHAT_MESSAGE | DIRECT_MESSAGE => NoticeIcon::Message,
        COLLABORATION_OFFER | COLLABORATION_RESPONSE => NoticeIcon::Handshake,
        _ => return None,
    };
    Some(icon)
}

/// Title used when the payload carries none
pub fn default_title(event_name: &str) -> &'static str {
    match event_name {
        SYSTEM_ALERT => "System alert",
        STATUS_CHANGED => "Status updated",
        ORDER_STATUS_CHANGED => "Order status updated",
        PAYMENT_RECEIVED => "Payment received",
        PAYMENT_FAILED => "Payment failed",
        BOOKING_REQUEST => "New booking request",
        BOOKING_UPDATED => "Booking updated",
        MODERATION_RESULT => "Moderation result",
        SUBSCRIPTION_CHANGED => "Subscription updated",
        SUBSCRIPTION_EXPIRING => "Subscription expiring soon",
        CONTENT_PUBLISHED => "Content published",
        CHAT_MESSAGE => "New message",
        DIRECT_MESSAGE => "New direct message",
        COLLABORATION_OFFER => "New collaboration offer",
        COLLABORATION_RESPONSE => "Collaboration response",
        _ => "Notification",
    }
}

/// Message used when the payload carries none
pub const DEFAULT_MESSAGE: &str = "You have a new notification";

/// Name for the other side of a role-sensitive event, as seen by `role`
///
/// Returns `None` for events that are not role-sensitive. Roles without an
/// entry get the event's generic label.
pub fn counterparty_label(event_name: &str, role: CabinetRole) -> Option<&'static str> {
    match event_name {
        COLLABORATION_OFFER | COLLABORATION_RESPONSE => Some(match role {
            CabinetRole::Artist | CabinetRole::Dj => "Producer",
            CabinetRole::Producer | CabinetRole::Radio => "Artist",
            _ => "Collaborator",
        }),
        BOOKING_REQUEST | BOOKING_UPDATED => Some(match role {
            CabinetRole::Artist | CabinetRole::Dj => "Venue",
            CabinetRole::Venue | CabinetRole::Radio => "Artist",
            _ => "Client",
        }),
        _ => None,
    }
}

/// Display label for a chat message's `source`/`channel` tag
pub fn chat_source_label(source: Option<&str>) -> &'static str {
    match source.map(str::to_ascii_lowercase).as_deref() {
        Some("support") => "Support",
        Some("admin") | Some("moderation") => "Administration",
        Some("order") | Some("content_order") => "Order chat",
        Some("booking") => "Booking chat",
        _ => "Chat",
    }
}
