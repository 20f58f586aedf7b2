//! Handler registry and fan-out

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::event::ProbeEvent;

/// Observer of probe events.
///
/// Handlers run on the probe's control loop, so a slow handler delays the
/// next check. A handler that panics is logged and skipped; the remaining
/// handlers still see the event.
pub trait ProbeEventHandler: Send + Sync {
    fn handle_probe_event(&self, event: &ProbeEvent);
}

impl<F> ProbeEventHandler for F
where
    F: Fn(&ProbeEvent) + Send + Sync,
{
    fn handle_probe_event(&self, event: &ProbeEvent) {
        self(event)
    }
}

/// Token returned on registration, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

type Registered = (HandlerId, Arc<dyn ProbeEventHandler>);

/// Ordered set of event handlers
pub struct EventHub {
    handlers: RwLock<Vec<Registered>>,
    next_id: AtomicU64,
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn add_handler(&self, handler: Arc<dyn ProbeEventHandler>) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((id, handler));
        id
    }

    /// Unregister a handler. Returns false if the id is unknown.
    pub fn remove_handler(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(registered, _)| *registered != id);
        handlers.len() != before
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Deliver an event to every handler registered at the time of the call.
    ///
    /// The handler list is copied before dispatch, so handlers may register
    /// or unregister handlers from inside the callback.
    pub fn emit(&self, event: &ProbeEvent) {
        let snapshot: Vec<Registered> = self.handlers.read().clone();

        for (id, handler) in snapshot {
            let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle_probe_event(event)));
            if let Err(panic) = outcome {
                tracing::warn!(
                    handler = ?id,
                    event = ?event.kind,
                    panic = panic_message(&*panic),
                    "probe event handler panicked"
                );
            }
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
