use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Action = Box<dyn FnOnce()>;

/// Undoes exactly one registration: a chrome layer, an event subscription,
/// or a message handler.
///
/// Disposing is idempotent. Clones share state, so disposing any clone
/// disposes them all. Dropping a `Disposer` does *not* dispose it; the
/// registration lives until `dispose` is called or the session resets.
#[must_use = "the registration stays active until dispose() is called"]
#[derive(Clone)]
pub struct Disposer {
    action: Rc<RefCell<Option<Action>>>,
}

impl Disposer {
    pub(crate) fn new(action: impl FnOnce() + 'static) -> Self {
        Self {
            action: Rc::new(RefCell::new(Some(Box::new(action)))),
        }
    }

    /// A disposer with nothing to undo.
    pub fn noop() -> Self {
        Self {
            action: Rc::new(RefCell::new(None)),
        }
    }

    pub fn dispose(&self) {
        let action = self.action.borrow_mut().take();
        if let Some(action) = action {
            action();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.action.borrow().is_none()
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
