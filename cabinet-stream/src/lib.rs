//! # Cabinet Stream Transport (cabinet-stream)
//!
//! Resilient server-sent-event client for a single user session.
//!
//! **Purpose:** Hold one long-lived `GET <base>/stream/<userId>` request open,
//! parse the event stream by hand (the request carries a bearer credential),
//! reconnect with bounded exponential backoff, and republish every event on a
//! named publish/subscribe surface that survives reconnect churn.
//!
//! **Architecture:**
//! - [`parser`]: resumable block parser over a text buffer
//! - [`policy`]: backoff schedule and attempt budget
//! - [`registry`]: event name → handler set, panic-isolated emission
//! - [`transport`]: connection state machine driving the read loop on Tokio

pub mod error;
pub mod events;
pub mod parser;
pub mod policy;
pub mod registry;
pub mod transport;

pub use error::StreamError;
pub use events::{DisconnectReason, LifecycleEvent, Payload, StreamEvent};
pub use parser::{parse_buffer, ParseOutput, ParsedEvent};
pub use policy::ReconnectPolicy;
pub use registry::{handler, Handler, HandlerRegistry};
pub use transport::{ConnectionState, StreamTransport, TransportConfig, DEFAULT_MAX_PENDING_BYTES};
