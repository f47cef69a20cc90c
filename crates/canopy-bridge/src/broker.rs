//! Messaging between surfaces.
//!
//! Envelopes go through a connected relay when one is attached. Without a
//! relay, or once a relay send fails, they are handed to the host as
//! `broker.<kind>` sends and the host does the routing. Recipients see a
//! `"message"` event carrying `{ from, payload }` either way.

use std::cell::RefCell;
use std::rc::Rc;

use canopy_common::{
    BridgeError, BrokerEnvelope, BrokerKind, MessageDelivery, Route, BROKER_NAMESPACE,
    MESSAGE_EVENT,
};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::disposer::Disposer;
use crate::identity::SurfaceIdentity;
use crate::router::EventRouter;
use crate::transport::Transport;

/// An outbound connection to a shared relay process.
pub trait RelayLink {
    fn is_open(&self) -> bool;

    /// Send one serialized broker envelope.
    fn send(&self, frame: String) -> Result<(), BridgeError>;
}

pub struct MessagingBroker {
    identity: SurfaceIdentity,
    transport: Rc<Transport>,
    router: EventRouter,
    relay: RefCell<Option<Rc<dyn RelayLink>>>,
}

impl MessagingBroker {
    pub fn new(identity: SurfaceIdentity, transport: Rc<Transport>, router: EventRouter) -> Self {
        Self {
            identity,
            transport,
            router,
            relay: RefCell::new(None),
        }
    }

    /// Message the primary surface. Dropped when sent from the primary.
    pub fn post_to_parent(&self, payload: Value) {
        self.dispatch(BrokerEnvelope::new(
            BrokerKind::PostToParent,
            self.identity.name(),
            payload,
        ));
    }

    pub fn post_to_child(&self, name: &str, payload: Value) {
        self.dispatch(BrokerEnvelope::to_child(self.identity.name(), name, payload));
    }

    /// Message every other surface.
    pub fn broadcast(&self, payload: Value) {
        self.dispatch(BrokerEnvelope::new(
            BrokerKind::Broadcast,
            self.identity.name(),
            payload,
        ));
    }

    /// Subscribe to messages from other surfaces.
    pub fn on_message(&self, handler: impl Fn(&str, &Value) + 'static) -> Disposer {
        self.router.on(MESSAGE_EVENT, move |event| {
            match serde_json::from_value::<MessageDelivery>(event.data.clone()) {
                Ok(delivery) => handler(&delivery.from, &delivery.payload),
                Err(e) => warn!(error = %e, "malformed message event dropped"),
            }
        })
    }

    pub fn attach_relay(&self, relay: Rc<dyn RelayLink>) {
        debug!(surface = %self.identity, "relay attached");
        *self.relay.borrow_mut() = Some(relay);
    }

    pub fn detach_relay(&self) {
        if self.relay.borrow_mut().take().is_some() {
            debug!(surface = %self.identity, "relay detached");
        }
    }

    pub fn has_relay(&self) -> bool {
        self.relay.borrow().as_ref().is_some_and(|relay| relay.is_open())
    }

    fn dispatch(&self, envelope: BrokerEnvelope) {
        if envelope.route() == Route::Nowhere {
            debug!(
                surface = %self.identity,
                kind = envelope.kind.as_str(),
                "broker message has no destination"
            );
            return;
        }

        if self.try_relay(&envelope) {
            return;
        }

        match serde_json::to_value(&envelope) {
            Ok(args) => {
                trace!(kind = envelope.kind.as_str(), "broker message via host");
                self.transport.send(BROKER_NAMESPACE, envelope.kind.as_str(), args);
            }
            Err(e) => warn!(error = %e, "broker envelope not serializable"),
        }
    }

    /// Returns `true` once the relay accepted the envelope. A closed or
    /// failing relay is dropped so later messages go straight to the host.
    fn try_relay(&self, envelope: &BrokerEnvelope) -> bool {
        let Some(relay) = self.relay.borrow().clone() else {
            return false;
        };
        if !relay.is_open() {
            self.detach_relay();
            return false;
        }

        let sent = serde_json::to_string(envelope)
            .map_err(BridgeError::from)
            .and_then(|frame| relay.send(frame));
        match sent {
            Ok(()) => {
                trace!(kind = envelope.kind.as_str(), "broker message via relay");
                true
            }
            Err(e) => {
                warn!(error = %e, "relay send failed, falling back to host routing");
                self.detach_relay();
                false
            }
        }
    }
}
