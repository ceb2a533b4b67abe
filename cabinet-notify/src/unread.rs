//! Session-local unread badge count

use cabinet_stream::{events::WILDCARD, handler, Handler, StreamTransport};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

use crate::catalog;

/// Counts countable events from 0; only [`mark_read`](Self::mark_read) resets it
///
/// Not persisted and not reconciled with any server-side total.
pub struct UnreadCounter {
    transport: StreamTransport,
    count: Arc<AtomicU64>,
    handler: Handler,
}

impl UnreadCounter {
    pub fn new(transport: StreamTransport) -> Self {
        let count = Arc::new(AtomicU64::new(0));
        let counted = Arc::clone(&count);
        let handler = handler(move |event| {
            if catalog::is_countable(&event.event) {
                let unread = counted.fetch_add(1, Ordering::SeqCst) + 1;
                trace!(event = %event.event, unread, "Unread count incremented");
            }
        });

        Self {
            transport,
            count,
            handler,
        }
    }

    /// Start counting; calling twice does not double-count
    pub fn attach(&self) {
        self.transport.on(WILDCARD, Arc::clone(&self.handler));
    }

    pub fn detach(&self) {
        self.transport.off(WILDCARD, &self.handler);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn mark_read(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

impl Drop for UnreadCounter {
    fn drop(&mut self) {
        self.detach();
    }
}
