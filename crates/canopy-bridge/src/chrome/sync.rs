use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use canopy_common::{CHROME_NAMESPACE, CHROME_SYNC_METHOD};
use serde_json::Value;
use tracing::{debug, trace};

use super::element::ElementDescriptor;
use super::stack::{LayerId, LayerStack};
use crate::disposer::Disposer;
use crate::scheduler::Scheduler;
use crate::transport::Transport;

struct SyncState {
    stack: RefCell<LayerStack>,
    transport: Rc<Transport>,
    scheduler: Rc<dyn Scheduler>,
    flush_pending: Cell<bool>,
    generation: Cell<u64>,
    flushes: Cell<u64>,
}

impl SyncState {
    fn remove_layer(self: &Rc<Self>, id: LayerId) {
        let removed = self.stack.borrow_mut().remove(id);
        if removed {
            trace!(layer = ?id, "chrome layer removed");
            self.schedule_flush();
        }
    }

    fn schedule_flush(self: &Rc<Self>) {
        if self.flush_pending.replace(true) {
            return;
        }
        let generation = self.generation.get();
        let state: Weak<Self> = Rc::downgrade(self);
        self.scheduler.defer(Box::new(move || {
            if let Some(state) = state.upgrade() {
                state.flush(generation);
            }
        }));
    }

    fn flush(&self, generation: u64) {
        if self.generation.get() != generation {
            trace!(generation, "stale chrome flush skipped");
            return;
        }
        self.flush_pending.set(false);

        // Snapshot before sending: the send may re-enter and mutate the stack.
        let (state, layers) = {
            let stack = self.stack.borrow();
            (stack.effective_state(), stack.len())
        };
        self.flushes.set(self.flushes.get() + 1);
        debug!(layers, "flushing chrome state");
        self.transport.send(CHROME_NAMESPACE, CHROME_SYNC_METHOD, state);
    }
}

/// Merges chrome declarations from independent call sites and transmits
/// the effective state once per burst of mutations.
///
/// Every mutation marks a flush as pending and defers a single flush onto
/// the scheduler. Mutations made before it runs fold into the same
/// transmission, so a "remove then re-declare" sequence never reaches the
/// host as an intermediate state.
#[derive(Clone)]
pub struct ChromeSync {
    state: Rc<SyncState>,
}

impl ChromeSync {
    pub fn new(transport: Rc<Transport>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            state: Rc::new(SyncState {
                stack: RefCell::new(LayerStack::new()),
                transport,
                scheduler,
                flush_pending: Cell::new(false),
                generation: Cell::new(0),
                flushes: Cell::new(0),
            }),
        }
    }

    /// Push one layer holding `elements`. The returned disposer removes
    /// exactly that layer; disposing again does nothing.
    pub fn declare(&self, elements: impl IntoIterator<Item = ElementDescriptor>) -> Disposer {
        let id = self.state.stack.borrow_mut().push(elements);
        trace!(layer = ?id, "chrome layer pushed");
        self.state.schedule_flush();

        let state = Rc::downgrade(&self.state);
        Disposer::new(move || {
            if let Some(state) = state.upgrade() {
                state.remove_layer(id);
            }
        })
    }

    /// Drop every layer and invalidate any flush already scheduled.
    /// Nothing is transmitted until the next declaration.
    pub fn reset(&self) {
        self.state.stack.borrow_mut().clear();
        self.state.generation.set(self.state.generation.get() + 1);
        self.state.flush_pending.set(false);
        debug!("chrome state reset");
    }

    /// The state the next flush would transmit.
    pub fn effective_state(&self) -> Value {
        self.state.stack.borrow().effective_state()
    }

    pub fn layer_count(&self) -> usize {
        self.state.stack.borrow().len()
    }

    pub fn is_flush_pending(&self) -> bool {
        self.state.flush_pending.get()
    }

    /// Flushes actually transmitted (stale ones excluded).
    pub fn flush_count(&self) -> u64 {
        self.state.flushes.get()
    }
}
