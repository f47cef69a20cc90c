//! Request/reply and fire-and-forget transport between a surface and its host.
//!
//! Outbound frames are [`Envelope::Call`]s. Calls are paired with replies
//! either by the host link itself (direct reply) or by a correlation id the
//! transport allocates and matches against inbound `reply` frames.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use canopy_common::{BridgeError, Envelope, Reply};
use futures_util::future::{self, FutureExt, LocalBoxFuture};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::host::HostLink;
use crate::router::BridgeEvent;

pub type CallFuture = LocalBoxFuture<'static, Result<Value, BridgeError>>;

type PendingReply = oneshot::Sender<Result<Value, BridgeError>>;

pub struct Transport {
    host: Rc<dyn HostLink>,
    next_id: Cell<u64>,
    pending: RefCell<HashMap<String, PendingReply>>,
    pending_warning: usize,
}

impl Transport {
    pub fn new(host: Rc<dyn HostLink>) -> Self {
        Self {
            host,
            next_id: Cell::new(0),
            pending: RefCell::new(HashMap::new()),
            pending_warning: 0,
        }
    }

    /// Log a warning whenever the pending table reaches `threshold` entries.
    pub fn with_pending_warning(mut self, threshold: usize) -> Self {
        self.pending_warning = threshold;
        self
    }

    pub fn is_attached(&self) -> bool {
        self.host.is_attached()
    }

    /// Number of calls awaiting a correlated reply.
    pub fn pending_calls(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Fire-and-forget. Dropped silently when no host is attached.
    pub fn send(&self, namespace: &str, method: &str, args: Value) {
        if !self.is_attached() {
            debug!(namespace, method, "send dropped: no host attached");
            return;
        }
        let posted = Envelope::call(None, namespace, method, args)
            .to_json()
            .and_then(|frame| self.host.post(frame));
        if let Err(e) = posted {
            warn!(namespace, method, error = %e, "send failed");
        }
    }

    /// Request/reply. The frame is posted before this returns; the future
    /// only waits for the answer.
    ///
    /// Without a host the future resolves to `Value::Null` so callers need no
    /// environment checks.
    pub fn call(&self, namespace: &str, method: &str, args: Value) -> CallFuture {
        if !self.is_attached() {
            debug!(namespace, method, "call short-circuited: no host attached");
            return future::ready(Ok(Value::Null)).boxed_local();
        }

        let id = self.next_correlation_id();
        let frame = match Envelope::call(Some(id.clone()), namespace, method, args).to_json() {
            Ok(frame) => frame,
            Err(e) => return future::ready(Err(e)).boxed_local(),
        };

        if self.host.supports_direct_reply() {
            trace!(id = %id, namespace, method, "call awaiting direct reply");
            let reply = self.host.request(frame);
            return async move {
                match reply.await {
                    Ok(reply) => reply.into_result(),
                    Err(BridgeError::TransportUnavailable) => Ok(Value::Null),
                    Err(e) => Err(e),
                }
            }
            .boxed_local();
        }

        let (tx, rx) = oneshot::channel();
        let outstanding = {
            let mut pending = self.pending.borrow_mut();
            pending.insert(id.clone(), tx);
            pending.len()
        };
        if self.pending_warning > 0 && outstanding >= self.pending_warning {
            warn!(outstanding, "many calls awaiting host replies");
        }

        if let Err(e) = self.host.post(frame) {
            self.pending.borrow_mut().remove(&id);
            return match e {
                // Host vanished between the check and the post.
                BridgeError::TransportUnavailable => future::ready(Ok(Value::Null)).boxed_local(),
                other => future::ready(Err(other)).boxed_local(),
            };
        }
        trace!(id = %id, namespace, method, "call awaiting tagged reply");

        async move {
            match rx.await {
                Ok(outcome) => outcome,
                Err(_) => Err(BridgeError::Cancelled),
            }
        }
        .boxed_local()
    }

    /// Handle one frame pushed by the host (or the relay). Replies settle
    /// their pending call; events are returned for the router.
    pub fn receive(&self, raw: &str) -> Option<BridgeEvent> {
        let envelope = match Envelope::parse(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(body_len = raw.len(), error = %e, "inbound frame rejected");
                return None;
            }
        };

        match envelope {
            Envelope::Event { event, data, .. } => Some(BridgeEvent::new(event, data)),
            Envelope::Reply { id, result, error } => {
                self.settle(&id, Reply { result, error });
                None
            }
            Envelope::Call {
                namespace, method, ..
            } => {
                warn!(namespace = %namespace, method = %method, "inbound call ignored: surfaces do not serve calls");
                None
            }
        }
    }

    fn settle(&self, id: &str, reply: Reply) {
        let Some(tx) = self.pending.borrow_mut().remove(id) else {
            debug!(id, "reply for unknown call dropped");
            return;
        };
        // The caller may have dropped its future; nothing to do then.
        let _ = tx.send(reply.into_result());
    }

    /// Fail every outstanding call with [`BridgeError::Cancelled`].
    pub fn cancel_pending(&self) -> usize {
        let drained: Vec<PendingReply> = self.pending.borrow_mut().drain().map(|(_, tx)| tx).collect();
        let count = drained.len();
        for tx in drained {
            let _ = tx.send(Err(BridgeError::Cancelled));
        }
        if count > 0 {
            debug!(count, "pending calls cancelled");
        }
        count
    }

    fn next_correlation_id(&self) -> String {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id.to_string()
    }
}
