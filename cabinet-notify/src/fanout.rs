//! Role-aware notification fan-out over a [`StreamTransport`]
//!
//! One handler is created per recognised event name when the fanout is built
//! and reused for every attach, so attach/detach cycles register and remove the
//! same `Arc`s and never leak. The viewer role and the per-event callback are
//! read when an event arrives; re-attaching with a new role takes effect for
//! the next event.

use cabinet_common::CabinetRole;
use cabinet_stream::{handler, Handler, StreamEvent, StreamTransport};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::catalog::{GENERIC_EVENTS, SHAPED_EVENTS};
use crate::effects::NotificationEffects;
use crate::notice::{Notice, SoundCue};
use crate::payload::NotificationPayload;

/// Called once for every event the fanout handles
pub type EventCallback = Arc<dyn Fn(&StreamEvent) + Send + Sync>;

#[derive(Default)]
struct Viewer {
    role: CabinetRole,
    on_any_event: Option<EventCallback>,
    attached: bool,
}

struct Shared {
    effects: NotificationEffects,
    viewer: Mutex<Viewer>,
}

impl Shared {
    fn viewer(&self) -> MutexGuard<'_, Viewer> {
        self.viewer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn handle(&self, event: &StreamEvent) {
        let (role, on_any_event) = {
            let viewer = self.viewer();
            (viewer.role, viewer.on_any_event.clone())
        };

        let payload = NotificationPayload::from_event(&event.event, &event.data);
        let notice = Notice::render(&event.event, &payload, role);
        trace!(event = %event.event, role = %role, title = %notice.title, "Rendering notice");

        self.effects.deliver(&notice, SoundCue::for_payload(&payload));

        if let Some(callback) = on_any_event {
            callback(event);
        }
    }
}

/// Translates transport events into notices, audio cues and push requests
pub struct NotificationFanout {
    transport: StreamTransport,
    shared: Arc<Shared>,
    handlers: Vec<(&'static str, Handler)>,
}

impl NotificationFanout {
    pub fn new(transport: StreamTransport, effects: NotificationEffects) -> Self {
        let shared = Arc::new(Shared {
            effects,
            viewer: Mutex::new(Viewer::default()),
        });

        let handlers = GENERIC_EVENTS
            .iter()
            .chain(SHAPED_EVENTS)
            .map(|name| {
                let shared = Arc::clone(&shared);
                let h = handler(move |event| shared.handle(event));
                (*name, h)
            })
            .collect();

        Self {
            transport,
            shared,
            handlers,
        }
    }

    /// Register the fanout's handlers for a `role` viewer
    ///
    /// Calling again while attached only replaces the role and callback.
    pub fn attach(&self, role: CabinetRole, on_any_event: Option<EventCallback>) {
        {
            let mut viewer = self.shared.viewer();
            viewer.role = role;
            viewer.on_any_event = on_any_event;
            viewer.attached = true;
        }

        let added = self
            .handlers
            .iter()
            .filter(|(name, h)| self.transport.on(name, Arc::clone(h)))
            .count();

        debug!(role = %role, handlers = added, "Notification fanout attached");
    }

    /// Unregister everything `attach` registered; other subscribers are untouched
    pub fn detach(&self) {
        let removed = self
            .handlers
            .iter()
            .filter(|(name, h)| self.transport.off(name, h))
            .count();

        let mut viewer = self.shared.viewer();
        viewer.attached = false;
        viewer.on_any_event = None;

        if removed > 0 {
            debug!(handlers = removed, "Notification fanout detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.shared.viewer().attached
    }

    pub fn role(&self) -> CabinetRole {
        self.shared.viewer().role
    }

    /// Event names the fanout subscribes to
    pub fn event_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.iter().map(|(name, _)| *name)
    }
}

impl Drop for NotificationFanout {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for NotificationFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationFanout")
            .field("role", &self.role())
            .field("attached", &self.is_attached())
            .field("events", &self.handlers.len())
            .finish()
    }
}
