//! Event name → handler set
//!
//! Handlers are compared by `Arc` identity: registering the same handler twice
//! for one name is a no-op, and `off` removes exactly that handler. Emission
//! iterates over a snapshot, so a handler may register or unregister handlers
//! (itself included) while an event is being delivered.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::error;

use crate::events::{StreamEvent, WILDCARD};

/// Subscriber callback
pub type Handler = Arc<dyn Fn(&StreamEvent) + Send + Sync>;

/// Wrap a closure as a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&StreamEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Handler sets keyed by event name, `"*"` included
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Mutex<HashMap<String, Vec<Handler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Handler>>> {
        // A poisoned map is still structurally valid
        self.handlers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register `handler` for `event_name`; returns false if already registered
    pub fn on(&self, event_name: &str, handler: Handler) -> bool {
        let mut handlers = self.lock();
        let set = handlers.entry(event_name.to_string()).or_default();
        if set.iter().any(|h| same_handler(h, &handler)) {
            return false;
        }
        set.push(handler);
        true
    }

    /// Unregister `handler` from `event_name`; returns false if it was not registered
    pub fn off(&self, event_name: &str, handler: &Handler) -> bool {
        let mut handlers = self.lock();
        let Some(set) = handlers.get_mut(event_name) else {
            return false;
        };
        let before = set.len();
        set.retain(|h| !same_handler(h, handler));
        let removed = set.len() != before;
        if set.is_empty() {
            handlers.remove(event_name);
        }
        removed
    }

    /// Handlers registered for exactly `event_name`
    pub fn handler_count(&self, event_name: &str) -> usize {
        self.lock().get(event_name).map_or(0, Vec::len)
    }

    /// Handlers registered across all names
    pub fn total_handlers(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    /// Deliver `event` to its named handlers, then to wildcard handlers
    ///
    /// A panicking handler is logged and skipped; the remaining handlers
    /// still run.
    pub fn emit(&self, event: &StreamEvent) {
        let snapshot: Vec<Handler> = {
            let handlers = self.lock();
            let named = handlers.get(event.event.as_str()).into_iter().flatten();
            let wildcard = handlers.get(WILDCARD).into_iter().flatten();
            named.chain(wildcard).cloned().collect()
        };

        for handler in snapshot {
            let result = catch_unwind(AssertUnwindSafe(|| handler(event)));
            if result.is_err() {
                error!(event = %event.event, "Event handler panicked");
            }
        }
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.lock();
        let counts: HashMap<&str, usize> =
            handlers.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("HandlerRegistry").field("handlers", &counts).finish()
    }
}
