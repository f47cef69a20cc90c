//! Typed event router fanning host-pushed events out to subscribers.
//!
//! Subscriptions are either for one event type or for every event
//! (wildcard). Dispatch order is type-specific handlers first, then wildcard
//! handlers, each group in registration order.

mod slots;

#[cfg(test)]
mod tests;

use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{trace, warn};

use crate::disposer::Disposer;

pub use slots::CallbackSlots;

/// Marker accepted by [`EventRouter::on`] for wildcard subscriptions.
pub const WILDCARD: &str = "*";

/// One host-pushed event, including its type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeEvent {
    #[serde(rename = "event")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl BridgeEvent {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

pub type Handler = Rc<dyn Fn(&BridgeEvent)>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Topic {
    Kind(String),
    Any,
}

struct Subscription {
    id: u64,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    typed: HashMap<String, Vec<Subscription>>,
    wildcard: Vec<Subscription>,
}

impl Registry {
    fn insert(&mut self, topic: &Topic, handler: Handler) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        let subscription = Subscription { id, handler };
        match topic {
            Topic::Kind(kind) => self.typed.entry(kind.clone()).or_default().push(subscription),
            Topic::Any => self.wildcard.push(subscription),
        }
        id
    }

    fn remove(&mut self, topic: &Topic, id: u64) {
        match topic {
            Topic::Kind(kind) => {
                if let Some(subs) = self.typed.get_mut(kind) {
                    subs.retain(|s| s.id != id);
                    if subs.is_empty() {
                        self.typed.remove(kind);
                    }
                }
            }
            Topic::Any => self.wildcard.retain(|s| s.id != id),
        }
    }

    fn matching(&self, kind: &str) -> Vec<Handler> {
        self.typed
            .get(kind)
            .into_iter()
            .flatten()
            .chain(self.wildcard.iter())
            .map(|s| Rc::clone(&s.handler))
            .collect()
    }
}

/// Cheap to clone; clones share one subscriber registry.
#[derive(Clone, Default)]
pub struct EventRouter {
    registry: Rc<RefCell<Registry>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one event type. `"*"` subscribes to every event.
    pub fn on(&self, kind: impl Into<String>, handler: impl Fn(&BridgeEvent) + 'static) -> Disposer {
        self.on_handler(kind, Rc::new(handler))
    }

    /// Subscribe to every event regardless of type.
    pub fn on_any(&self, handler: impl Fn(&BridgeEvent) + 'static) -> Disposer {
        self.subscribe(Topic::Any, Rc::new(handler))
    }

    pub(crate) fn on_handler(&self, kind: impl Into<String>, handler: Handler) -> Disposer {
        let kind = kind.into();
        let topic = if kind == WILDCARD {
            Topic::Any
        } else {
            Topic::Kind(kind)
        };
        self.subscribe(topic, handler)
    }

    fn subscribe(&self, topic: Topic, handler: Handler) -> Disposer {
        let id = self.registry.borrow_mut().insert(&topic, handler);
        let registry = Rc::downgrade(&self.registry);
        Disposer::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().remove(&topic, id);
            }
        })
    }

    /// Dispatch one event. Returns how many handlers were invoked.
    ///
    /// The handler list is snapshotted first, so handlers may subscribe or
    /// dispose during dispatch. A panicking handler does not stop the rest of
    /// the dispatch; the first panic is resumed once every handler has run.
    pub fn emit(&self, event: &BridgeEvent) -> usize {
        let handlers = self.registry.borrow().matching(&event.kind);
        trace!(event = %event.kind, handlers = handlers.len(), "dispatching event");

        let mut first_panic = None;
        for handler in &handlers {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                warn!(event = %event.kind, "event handler panicked");
                first_panic.get_or_insert(payload);
            }
        }
        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
        handlers.len()
    }

    /// Drop every subscription. Outstanding disposers become no-ops.
    pub fn clear(&self) {
        let mut registry = self.registry.borrow_mut();
        registry.typed.clear();
        registry.wildcard.clear();
    }

    /// Type-specific subscriptions for `kind` (wildcards excluded).
    pub fn subscriber_count(&self, kind: &str) -> usize {
        self.registry.borrow().typed.get(kind).map_or(0, Vec::len)
    }

    pub fn wildcard_count(&self) -> usize {
        self.registry.borrow().wildcard.len()
    }

    pub fn is_empty(&self) -> bool {
        let registry = self.registry.borrow();
        registry.typed.is_empty() && registry.wildcard.is_empty()
    }
}
