use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use crate::models::{AppEvent, EventKind};

type Handler = Arc<dyn Fn(&AppEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
    listeners: HashMap<EventKind, Vec<(ListenerId, Handler)>>,
}

/// In-process publish/subscribe between views.
///
/// Delivery is synchronous and reaches only the listeners registered when
/// `emit` is called. Nothing is queued for late subscribers and nothing is
/// acknowledged.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

#[derive(Default)]
struct BusInner {
    registry: Mutex<Registry>,
    next_id: AtomicU64,
}

impl BusInner {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut registry = self.registry();
        let Some(listeners) = registry.listeners.get_mut(&kind) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        before != listeners.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.inner.registry();
        let counts: HashMap<_, _> = registry
            .listeners
            .iter()
            .map(|(kind, listeners)| (kind.as_str(), listeners.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

static GLOBAL_BUS: OnceLock<EventBus> = OnceLock::new();

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bus shared by every view in the process.
    pub fn global() -> &'static EventBus {
        GLOBAL_BUS.get_or_init(EventBus::new)
    }

    /// Register `handler` for `kind`. The listener lives as long as the
    /// returned guard.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&AppEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let handler: Handler = Arc::new(handler);
        self.inner
            .registry()
            .listeners
            .entry(kind)
            .or_default()
            .push((id, handler));
        tracing::trace!(event = kind.as_str(), ?id, "listener registered");

        Subscription {
            bus: Arc::downgrade(&self.inner),
            kind,
            id,
            active: true,
        }
    }

    /// Deliver `event` to every current listener of its kind, in registration
    /// order. Returns how many listeners were called.
    pub fn emit(&self, event: AppEvent) -> usize {
        let kind = event.kind();
        // Snapshot so handlers may subscribe, unsubscribe or emit re-entrantly.
        let handlers: Vec<Handler> = self
            .inner
            .registry()
            .listeners
            .get(&kind)
            .map(|listeners| listeners.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();

        for handler in &handlers {
            handler(&event);
        }
        tracing::debug!(event = kind.as_str(), delivered = handlers.len(), "event emitted");
        handlers.len()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner
            .registry()
            .listeners
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Weak<BusInner>,
    kind: EventKind,
    id: ListenerId,
    active: bool,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(bus) = self.bus.upgrade() {
            if bus.remove(self.kind, self.id) {
                tracing::trace!(event = self.kind.as_str(), id = ?self.id, "listener removed");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}
