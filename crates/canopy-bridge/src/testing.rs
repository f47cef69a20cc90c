//! In-memory host link for tests, here and in downstream crates.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use canopy_common::{BridgeError, Envelope, Reply, CHROME_NAMESPACE, CHROME_SYNC_METHOD};
use futures_util::future::{self, FutureExt};
use serde_json::Value;

use crate::host::{HostLink, ReplyFuture};

/// Records every posted frame. Direct replies are served from a FIFO queue
/// filled with [`RecordingHost::queue_reply`].
#[derive(Debug, Default)]
pub struct RecordingHost {
    attached: Cell<bool>,
    direct_replies: bool,
    frames: RefCell<Vec<String>>,
    replies: RefCell<VecDeque<Reply>>,
}

impl RecordingHost {
    pub fn attached() -> Rc<Self> {
        Rc::new(Self {
            attached: Cell::new(true),
            ..Self::default()
        })
    }

    pub fn detached() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn with_direct_replies() -> Rc<Self> {
        Rc::new(Self {
            attached: Cell::new(true),
            direct_replies: true,
            ..Self::default()
        })
    }

    pub fn set_attached(&self, attached: bool) {
        self.attached.set(attached);
    }

    pub fn queue_reply(&self, reply: Reply) {
        self.replies.borrow_mut().push_back(reply);
    }

    /// Raw frames in post order.
    pub fn frames(&self) -> Vec<String> {
        self.frames.borrow().clone()
    }

    pub fn sent(&self) -> Vec<Envelope> {
        self.frames
            .borrow()
            .iter()
            .filter_map(|frame| Envelope::parse(frame).ok())
            .collect()
    }

    /// `args` of every call posted to `namespace.method`.
    pub fn calls_to(&self, namespace: &str, method: &str) -> Vec<Value> {
        self.sent()
            .into_iter()
            .filter_map(|envelope| match envelope {
                Envelope::Call {
                    namespace: ns,
                    method: m,
                    args,
                    ..
                } if ns == namespace && m == method => Some(args),
                _ => None,
            })
            .collect()
    }

    /// Every chrome state transmitted so far.
    pub fn chrome_states(&self) -> Vec<Value> {
        self.calls_to(CHROME_NAMESPACE, CHROME_SYNC_METHOD)
    }

    pub fn clear(&self) {
        self.frames.borrow_mut().clear();
    }
}

impl HostLink for RecordingHost {
    fn is_attached(&self) -> bool {
        self.attached.get()
    }

    fn post(&self, frame: String) -> Result<(), BridgeError> {
        if !self.attached.get() {
            return Err(BridgeError::TransportUnavailable);
        }
        self.frames.borrow_mut().push(frame);
        Ok(())
    }

    fn supports_direct_reply(&self) -> bool {
        self.direct_replies
    }

    fn request(&self, frame: String) -> ReplyFuture {
        if let Err(e) = self.post(frame) {
            return future::ready(Err(e)).boxed_local();
        }
        let outcome = self
            .replies
            .borrow_mut()
            .pop_front()
            .ok_or(BridgeError::Cancelled);
        future::ready(outcome).boxed_local()
    }
}
