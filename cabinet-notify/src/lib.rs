//! # Cabinet Notifications (cabinet-notify)
//!
//! Turns the events of a [`cabinet_stream::StreamTransport`] into what a
//! cabinet viewer sees and hears.
//!
//! **Architecture:**
//! - [`catalog`]: recognised event names, icons, default copy, role labels
//! - [`payload`]: tolerant field access over loosely-typed event data
//! - [`notice`]: notice rendering and audio cue selection
//! - [`effects`]: display / audio / push seams, each fault-isolated
//! - [`fanout`]: attaches one handler per recognised event to a transport
//! - [`unread`]: unread badge count
//! - [`console`]: terminal effects used by the `cabinet-notify` binary

pub mod catalog;
pub mod console;
pub mod effects;
pub mod fanout;
pub mod notice;
pub mod payload;
pub mod unread;

pub use effects::{AudioCuePlayer, EffectError, NoticeSink, NotificationEffects, PushNotifier};
pub use fanout::{EventCallback, NotificationFanout};
pub use notice::{Notice, NoticeIcon, SoundCue};
pub use payload::{NotificationPayload, PayloadFields};
pub use unread::UnreadCounter;
