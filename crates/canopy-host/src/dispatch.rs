//! Host-side dispatcher for frames coming from surfaces.
//!
//! Every call frame is answered by exactly one of:
//! - `chrome.setState`: forwarded to the [`ChromeReconciler`]
//! - `broker.*`: routed to other surfaces as `"message"` events
//! - a registered `(namespace, method)` handler
//! - an `UnknownMethod` error

use std::collections::HashMap;
use std::rc::Rc;

use canopy_common::{
    BridgeError, BrokerEnvelope, BrokerKind, Envelope, HostError, Route, BROKER_NAMESPACE,
    CHROME_NAMESPACE, CHROME_SYNC_METHOD, SURFACE_ATTACHED_EVENT, SURFACE_DETACHED_EVENT,
};
use serde_json::{json, Value};
use tracing::{debug, trace, warn};

use crate::reconcile::ChromeReconciler;
use crate::registry::SurfaceRegistry;
use crate::surface::SurfaceHandle;

/// Handler for one `(namespace, method)` pair. Receives the calling
/// surface's name and the call arguments.
pub type MethodHandler = Box<dyn Fn(&str, Value) -> Result<Value, String>>;

pub struct HostBridge {
    registry: SurfaceRegistry,
    reconciler: Box<dyn ChromeReconciler>,
    handlers: HashMap<(String, String), MethodHandler>,
}

impl HostBridge {
    pub fn new(reconciler: impl ChromeReconciler + 'static) -> Self {
        Self {
            registry: SurfaceRegistry::new(),
            reconciler: Box::new(reconciler),
            handlers: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &SurfaceRegistry {
        &self.registry
    }

    /// Register a handler, replacing any previous one for the same pair.
    pub fn handle(
        &mut self,
        namespace: impl Into<String>,
        method: impl Into<String>,
        handler: impl Fn(&str, Value) -> Result<Value, String> + 'static,
    ) {
        self.handlers
            .insert((namespace.into(), method.into()), Box::new(handler));
    }

    /// Map `name` to a surface and announce it to the others.
    pub fn attach_surface(&mut self, name: &str, handle: &Rc<dyn SurfaceHandle>) {
        self.registry.attach(name, handle);
        self.notify_others(name, SURFACE_ATTACHED_EVENT);
    }

    /// Forget `name`, tear down its chrome and announce the departure.
    pub fn close_surface(&mut self, name: &str) {
        if self.registry.close(name) {
            self.reconciler.surface_closed(name);
            self.notify_others(name, SURFACE_DETACHED_EVENT);
        }
    }

    /// Drop surfaces whose handles are gone or closed, tearing down their
    /// chrome and announcing each departure. Returns the pruned names.
    pub fn prune(&mut self) -> Vec<String> {
        let pruned = self.registry.prune();
        for name in &pruned {
            self.reconciler.surface_closed(name);
            self.notify_others(name, SURFACE_DETACHED_EVENT);
        }
        pruned
    }

    /// Handle one raw frame sent by the surface behind `source`. The sender
    /// is whatever name the registry holds for that handle; frames from
    /// unregistered handles are dropped. Tagged calls are answered with a
    /// `reply` frame pushed back to the sender.
    pub fn handle_message(
        &mut self,
        source: &Rc<dyn SurfaceHandle>,
        raw: &str,
    ) -> Result<(), HostError> {
        let Some(from) = self.registry.name_of(source).map(str::to_string) else {
            debug!(body_len = raw.len(), "frame from unregistered surface dropped");
            return Ok(());
        };
        let from = from.as_str();

        let envelope = match Envelope::parse(raw) {
            Ok(envelope) => envelope,
            Err(e) => return self.reject_malformed(from, raw, e),
        };

        match envelope {
            Envelope::Call {
                id,
                namespace,
                method,
                args,
            } => {
                let outcome = self.dispatch_call(from, &namespace, &method, args);
                match id {
                    Some(id) => self.push(from, &Envelope::reply(id, outcome)),
                    None => {
                        if let Err(message) = outcome {
                            warn!(surface = %from, namespace = %namespace, method = %method, error = %message, "send failed");
                        }
                        Ok(())
                    }
                }
            }
            Envelope::Reply { id, .. } => {
                debug!(surface = %from, id = %id, "unexpected reply from surface dropped");
                Ok(())
            }
            Envelope::Event { event, .. } => {
                debug!(surface = %from, event = %event, "unexpected event from surface dropped");
                Ok(())
            }
        }
    }

    /// Run one call and produce the value a direct reply channel would carry.
    pub fn dispatch_call(
        &mut self,
        from: &str,
        namespace: &str,
        method: &str,
        args: Value,
    ) -> Result<Value, String> {
        trace!(surface = %from, namespace, method, "dispatching call");

        if namespace == CHROME_NAMESPACE && method == CHROME_SYNC_METHOD {
            return self
                .reconciler
                .reconcile(from, &args)
                .map(|()| Value::Null)
                .map_err(|e| e.to_string());
        }

        if namespace == BROKER_NAMESPACE {
            if let Some(kind) = BrokerKind::from_method(method) {
                return self.route_broker(from, kind, args).map(|()| Value::Null);
            }
        }

        match self.handlers.get(&(namespace.to_string(), method.to_string())) {
            Some(handler) => handler(from, args),
            None => Err(BridgeError::UnknownMethod {
                namespace: namespace.to_string(),
                method: method.to_string(),
            }
            .to_string()),
        }
    }

    /// Push an event to one surface.
    pub fn emit(&self, surface: &str, event: &str, data: Value) -> Result<(), HostError> {
        self.push(surface, &Envelope::event(event, data))
    }

    /// Push an event to every live surface. Returns how many received it.
    pub fn emit_all(&self, event: &str, data: Value) -> usize {
        let frame = Envelope::event(event, data);
        self.registry
            .names()
            .iter()
            .filter(|name| self.push(name, &frame).is_ok())
            .count()
    }

    fn route_broker(&self, from: &str, kind: BrokerKind, args: Value) -> Result<(), String> {
        let mut envelope: BrokerEnvelope =
            serde_json::from_value(args).map_err(|e| format!("invalid broker envelope: {e}"))?;
        // The surface's registered name is authoritative.
        envelope.kind = kind;
        envelope.from = from.to_string();

        let targets = match envelope.route() {
            Route::Surface(name) => vec![name],
            Route::AllExcept(sender) => self
                .registry
                .names()
                .into_iter()
                .filter(|name| *name != sender)
                .collect(),
            Route::Nowhere => Vec::new(),
        };

        let frame = envelope.to_message_event();
        for target in targets {
            // Unknown or closed targets are dropped without telling the sender.
            if let Err(e) = self.push(&target, &frame) {
                debug!(surface = %from, target = %target, error = %e, "broker delivery dropped");
            }
        }
        Ok(())
    }

    fn reject_malformed(&self, from: &str, raw: &str, error: BridgeError) -> Result<(), HostError> {
        warn!(surface = %from, error = %error, "malformed frame from surface");
        let id = serde_json::from_str::<Value>(raw)
            .ok()
            .and_then(|value| value.get("id").and_then(Value::as_str).map(str::to_string));
        match id {
            Some(id) => self.push(from, &Envelope::reply(id, Err(error.to_string()))),
            None => Ok(()),
        }
    }

    fn notify_others(&self, name: &str, event: &str) {
        let frame = Envelope::event(event, json!({ "name": name }));
        for other in self.registry.names().iter().filter(|other| *other != name) {
            let _ = self.push(other, &frame);
        }
    }

    fn push(&self, surface: &str, envelope: &Envelope) -> Result<(), HostError> {
        let handle = self
            .registry
            .get(surface)
            .ok_or_else(|| HostError::SurfaceNotFound(surface.to_string()))?;
        let frame = envelope
            .to_json()
            .map_err(|e| HostError::Delivery(e.to_string()))?;
        handle.push(&frame)
    }
}

#[cfg(test)]
mod tests;
