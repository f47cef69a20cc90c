//! Replace-semantics callbacks layered on the stacking router.
//!
//! Per-element configuration often carries a single inline callback
//! (`onDismiss`, `onSelect`). Setting it again replaces the previous one and
//! setting `None` clears it. Each slot owns one ordinary router subscription.

use std::cell::RefCell;
use std::collections::HashMap;

use super::{EventRouter, Handler};
use crate::disposer::Disposer;

pub struct CallbackSlots {
    router: EventRouter,
    active: RefCell<HashMap<String, Disposer>>,
}

impl CallbackSlots {
    pub fn new(router: EventRouter) -> Self {
        Self {
            router,
            active: RefCell::new(HashMap::new()),
        }
    }

    /// Install `handler` as the only slot callback for `kind`, replacing any
    /// previous one. `None` clears the slot.
    pub fn set(&self, kind: impl Into<String>, handler: Option<Handler>) {
        let kind = kind.into();
        let previous = self.active.borrow_mut().remove(&kind);
        if let Some(previous) = previous {
            previous.dispose();
        }
        if let Some(handler) = handler {
            let disposer = self.router.on_handler(kind.clone(), handler);
            self.active.borrow_mut().insert(kind, disposer);
        }
    }

    pub fn clear(&self, kind: &str) {
        self.set(kind, None);
    }

    pub fn is_set(&self, kind: &str) -> bool {
        self.active.borrow().contains_key(kind)
    }

    /// Forget every slot. Used when the router itself has been cleared.
    pub fn clear_all(&self) {
        let drained: Vec<Disposer> = self.active.borrow_mut().drain().map(|(_, d)| d).collect();
        for disposer in drained {
            disposer.dispose();
        }
    }
}
