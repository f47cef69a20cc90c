//! One surface's bridge: transport, router, chrome and broker together,
//! with an explicit lifecycle.

use std::rc::Rc;
use std::time::Duration;

use canopy_common::{BridgeError, SessionId};
use canopy_config::{CanopyConfig, RelayConfig, SchedulerKind};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::broker::{MessagingBroker, RelayLink};
use crate::chrome::{ChromeSync, ElementDescriptor};
use crate::disposer::Disposer;
use crate::host::{DetachedHost, HostLink};
use crate::identity::SurfaceIdentity;
use crate::relay::RelayConnection;
use crate::router::{BridgeEvent, CallbackSlots, EventRouter, Handler};
use crate::scheduler::{LocalTaskScheduler, MicrotaskQueue, Scheduler};
use crate::transport::{CallFuture, Transport};

pub struct SessionBuilder {
    identity: Option<SurfaceIdentity>,
    host: Rc<dyn HostLink>,
    scheduler: SchedulerKind,
    pending_call_warning: usize,
}

impl SessionBuilder {
    fn new() -> Self {
        Self {
            identity: None,
            host: Rc::new(DetachedHost),
            scheduler: SchedulerKind::default(),
            pending_call_warning: 0,
        }
    }

    pub fn identity(mut self, identity: SurfaceIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn host(mut self, host: Rc<dyn HostLink>) -> Self {
        self.host = host;
        self
    }

    pub fn scheduler(mut self, scheduler: SchedulerKind) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn pending_call_warning(mut self, threshold: usize) -> Self {
        self.pending_call_warning = threshold;
        self
    }

    pub fn build(self) -> BridgeSession {
        let identity = self
            .identity
            .unwrap_or_else(|| SurfaceIdentity::resolve(None));
        let transport =
            Rc::new(Transport::new(self.host).with_pending_warning(self.pending_call_warning));

        let microtasks = match self.scheduler {
            SchedulerKind::Microtask => Some(Rc::new(MicrotaskQueue::new())),
            SchedulerKind::LocalTask => None,
        };
        let scheduler: Rc<dyn Scheduler> = match &microtasks {
            Some(queue) => queue.clone(),
            None => Rc::new(LocalTaskScheduler),
        };

        let router = EventRouter::new();
        let slots = CallbackSlots::new(router.clone());
        let chrome = ChromeSync::new(Rc::clone(&transport), scheduler);
        let broker = MessagingBroker::new(identity.clone(), Rc::clone(&transport), router.clone());

        info!(surface = %identity, attached = transport.is_attached(), "bridge session created");
        BridgeSession {
            identity,
            transport,
            router,
            slots,
            chrome,
            broker,
            microtasks,
        }
    }
}

/// Everything one surface needs to talk to its host and its peers.
///
/// Single-threaded by construction (`!Send`). Create one per surface and
/// pass it by reference to the code that needs it.
pub struct BridgeSession {
    identity: SurfaceIdentity,
    transport: Rc<Transport>,
    router: EventRouter,
    slots: CallbackSlots,
    chrome: ChromeSync,
    broker: MessagingBroker,
    microtasks: Option<Rc<MicrotaskQueue>>,
}

impl BridgeSession {
    /// Session for the surface named by `$CANOPY_SURFACE` (or `"main"`).
    pub fn create(host: Rc<dyn HostLink>) -> Self {
        Self::builder().host(host).build()
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn from_config(config: &CanopyConfig, host: Rc<dyn HostLink>) -> Self {
        Self::builder()
            .identity(SurfaceIdentity::from_config(config))
            .host(host)
            .scheduler(config.bridge.scheduler)
            .pending_call_warning(config.bridge.pending_call_warning as usize)
            .build()
    }

    pub fn identity(&self) -> &SurfaceIdentity {
        &self.identity
    }

    pub fn is_attached(&self) -> bool {
        self.transport.is_attached()
    }

    // -- transport --

    pub fn send(&self, namespace: &str, method: &str, args: Value) {
        self.transport.send(namespace, method, args);
    }

    pub fn call(&self, namespace: &str, method: &str, args: Value) -> CallFuture {
        self.transport.call(namespace, method, args)
    }

    pub fn pending_calls(&self) -> usize {
        self.transport.pending_calls()
    }

    // -- events --

    pub fn on(&self, kind: impl Into<String>, handler: impl Fn(&BridgeEvent) + 'static) -> Disposer {
        self.router.on(kind, handler)
    }

    pub fn on_any(&self, handler: impl Fn(&BridgeEvent) + 'static) -> Disposer {
        self.router.on_any(handler)
    }

    /// Single-callback registration: replaces any previous callback for
    /// `kind`, `None` clears it.
    pub fn set_handler(&self, kind: impl Into<String>, handler: Option<Handler>) {
        self.slots.set(kind, handler);
    }

    // -- chrome --

    pub fn declare(&self, elements: impl IntoIterator<Item = ElementDescriptor>) -> Disposer {
        self.chrome.declare(elements)
    }

    pub fn effective_state(&self) -> Value {
        self.chrome.effective_state()
    }

    // -- messaging --

    pub fn post_to_parent(&self, payload: Value) {
        self.broker.post_to_parent(payload);
    }

    pub fn post_to_child(&self, name: &str, payload: Value) {
        self.broker.post_to_child(name, payload);
    }

    pub fn broadcast(&self, payload: Value) {
        self.broker.broadcast(payload);
    }

    pub fn on_message(&self, handler: impl Fn(&str, &Value) + 'static) -> Disposer {
        self.broker.on_message(handler)
    }

    pub fn attach_relay(&self, relay: Rc<dyn RelayLink>) {
        self.broker.attach_relay(relay);
    }

    pub fn detach_relay(&self) {
        self.broker.detach_relay();
    }

    pub fn has_relay(&self) -> bool {
        self.broker.has_relay()
    }

    /// Connect to the relay named in `config` and route broker traffic
    /// through it. Returns the inbound frame receiver to pass to
    /// [`BridgeSession::drive`], or `None` when the relay is disabled.
    ///
    /// A failed connection is returned as an error; messaging keeps using
    /// host routing.
    pub async fn connect_relay(
        &self,
        config: &RelayConfig,
    ) -> Result<Option<mpsc::UnboundedReceiver<String>>, BridgeError> {
        let Some((connection, inbound)) =
            RelayConnection::from_config(config, &self.identity).await?
        else {
            return Ok(None);
        };
        self.attach_relay(Rc::new(connection));
        Ok(Some(inbound))
    }

    /// Like [`BridgeSession::connect_relay`] with explicit parameters.
    pub async fn connect_relay_to(
        &self,
        url: &str,
        session: SessionId,
        timeout: Duration,
    ) -> Result<mpsc::UnboundedReceiver<String>, BridgeError> {
        let (connection, inbound) =
            RelayConnection::connect(url, session, &self.identity, timeout).await?;
        self.attach_relay(Rc::new(connection));
        Ok(inbound)
    }

    // -- inbound --

    /// Handle one frame from the host or relay: settle a reply or dispatch
    /// an event. Deferred work is drained before and after, so chrome
    /// declared earlier reaches the host before the event is handled.
    /// Returns how many handlers ran.
    pub fn receive(&self, raw: &str) -> usize {
        self.run_microtasks();
        let handled = match self.transport.receive(raw) {
            Some(event) => self.router.emit(&event),
            None => 0,
        };
        self.run_microtasks();
        handled
    }

    /// Feed every frame from `inbound` to [`BridgeSession::receive`] until
    /// the channel closes.
    pub async fn drive(&self, mut inbound: mpsc::UnboundedReceiver<String>) {
        while let Some(frame) = inbound.recv().await {
            self.receive(&frame);
        }
        debug!(surface = %self.identity, "inbound channel closed");
    }

    /// Run deferred work (pending chrome flushes) now. Does nothing with
    /// the local-task scheduler, where tokio runs it.
    pub fn run_microtasks(&self) -> usize {
        self.microtasks
            .as_ref()
            .map_or(0, |queue| queue.run_until_idle())
    }

    // -- lifecycle --

    /// Drop every chrome layer and subscription and invalidate any pending
    /// flush. The session stays usable.
    pub fn reset(&self) {
        self.chrome.reset();
        self.slots.clear_all();
        self.router.clear();
        debug!(surface = %self.identity, "bridge session reset");
    }

    /// Reset, fail outstanding calls with `Cancelled` and drop the relay.
    pub fn dispose(self) {
        self.reset();
        let cancelled = self.transport.cancel_pending();
        self.broker.detach_relay();
        info!(surface = %self.identity, cancelled, "bridge session disposed");
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn chrome(&self) -> &ChromeSync {
        &self.chrome
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}
