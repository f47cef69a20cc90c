use std::cell::RefCell;
use std::rc::Rc;

use canopy_bridge::chrome::areas;
use canopy_bridge::{BridgeSession, ChannelHost, SurfaceIdentity};
use serde_json::json;

use super::*;
use crate::reconcile::{AreaRenderer, TrackingReconciler};

#[derive(Default)]
struct Inbox {
    frames: RefCell<Vec<String>>,
}

impl Inbox {
    fn envelopes(&self) -> Vec<Envelope> {
        self.frames
            .borrow()
            .iter()
            .map(|f| Envelope::parse(f).unwrap())
            .collect()
    }

    fn messages(&self) -> Vec<Value> {
        self.envelopes()
            .into_iter()
            .filter_map(|e| match e {
                Envelope::Event { event, data, .. } if event == "message" => Some(data),
                _ => None,
            })
            .collect()
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.frames.borrow_mut())
    }
}

impl SurfaceHandle for Inbox {
    fn push(&self, frame: &str) -> Result<(), HostError> {
        self.frames.borrow_mut().push(frame.to_string());
        Ok(())
    }
}

#[derive(Default, Clone)]
struct SharedLog(Rc<RefCell<Vec<String>>>);

impl AreaRenderer for SharedLog {
    fn apply(&mut self, surface: &str, area: &str, config: &Value) -> Result<(), HostError> {
        self.0.borrow_mut().push(format!("{surface}:apply:{area}:{config}"));
        Ok(())
    }

    fn reset(&mut self, surface: &str, area: &str) -> Result<(), HostError> {
        self.0.borrow_mut().push(format!("{surface}:reset:{area}"));
        Ok(())
    }
}

/// A surface the native side can close while its handle is still held.
struct Closing {
    open: std::cell::Cell<bool>,
}

impl Default for Closing {
    fn default() -> Self {
        Self {
            open: std::cell::Cell::new(true),
        }
    }
}

impl SurfaceHandle for Closing {
    fn push(&self, _frame: &str) -> Result<(), HostError> {
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.get()
    }
}

struct Harness {
    bridge: HostBridge,
    log: SharedLog,
    surfaces: Vec<(String, Rc<Inbox>, Rc<dyn SurfaceHandle>)>,
}

impl Harness {
    fn new(names: &[&str]) -> Self {
        let log = SharedLog::default();
        let mut bridge = HostBridge::new(TrackingReconciler::new(log.clone()));
        let mut surfaces = Vec::new();
        for name in names {
            let inbox = Rc::new(Inbox::default());
            let handle: Rc<dyn SurfaceHandle> = inbox.clone();
            bridge.attach_surface(name, &handle);
            surfaces.push((name.to_string(), inbox, handle));
        }
        for (_, inbox, _) in &surfaces {
            inbox.take();
        }
        Self {
            bridge,
            log,
            surfaces,
        }
    }

    fn handle(&self, name: &str) -> Rc<dyn SurfaceHandle> {
        self.surfaces
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, _, handle)| Rc::clone(handle))
            .unwrap()
    }

    /// Deliver `raw` as if the surface registered as `name` sent it.
    fn send(&mut self, name: &str, raw: &str) -> Result<(), HostError> {
        let handle = self.handle(name);
        self.bridge.handle_message(&handle, raw)
    }

    fn inbox(&self, name: &str) -> Rc<Inbox> {
        self.surfaces
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, inbox, _)| Rc::clone(inbox))
            .unwrap()
    }
}

fn call(id: Option<&str>, namespace: &str, method: &str, args: Value) -> String {
    Envelope::call(id.map(str::to_string), namespace, method, args)
        .to_json()
        .unwrap()
}

#[test]
fn post_to_child_reaches_only_the_named_surface() {
    let mut h = Harness::new(&["main", "settings", "help"]);
    let envelope = BrokerEnvelope::to_child("main", "settings", json!({ "refresh": true }));

    h.send(
            "main",
            &call(None, "broker", "postToChild", serde_json::to_value(&envelope).unwrap()),
        )
        .unwrap();

    assert_eq!(
        h.inbox("settings").messages(),
        vec![json!({ "from": "main", "payload": { "refresh": true } })]
    );
    assert!(h.inbox("help").frames.borrow().is_empty());
    assert!(h.inbox("main").frames.borrow().is_empty());
}

#[test]
fn broadcast_skips_sender_and_parent_goes_to_main() {
    let mut h = Harness::new(&["main", "a", "b"]);

    let broadcast = BrokerEnvelope::new(BrokerKind::Broadcast, "a", json!("hi"));
    h.send("a", &call(None, "broker", "broadcast", serde_json::to_value(&broadcast).unwrap()))
        .unwrap();
    let up = BrokerEnvelope::new(BrokerKind::PostToParent, "b", json!("up"));
    h.send("b", &call(None, "broker", "postToParent", serde_json::to_value(&up).unwrap()))
        .unwrap();

    assert_eq!(
        h.inbox("main").messages(),
        vec![json!({ "from": "a", "payload": "hi" }), json!({ "from": "b", "payload": "up" })]
    );
    assert_eq!(h.inbox("b").messages(), vec![json!({ "from": "a", "payload": "hi" })]);
    assert!(h.inbox("a").messages().is_empty());
}

#[test]
fn sender_name_comes_from_the_registry() {
    let mut h = Harness::new(&["main", "sheet"]);
    let forged = BrokerEnvelope::new(BrokerKind::PostToParent, "someone-else", json!(1));
    h.send("sheet", &call(None, "broker", "postToParent", serde_json::to_value(&forged).unwrap()))
        .unwrap();

    assert_eq!(h.inbox("main").messages()[0]["from"], "sheet");
}

#[test]
fn message_to_unknown_surface_is_dropped() {
    let mut h = Harness::new(&["main"]);
    let envelope = BrokerEnvelope::to_child("main", "ghost", json!(null));
    h.send(
            "main",
            &call(Some("1"), "broker", "postToChild", serde_json::to_value(&envelope).unwrap()),
        )
        .unwrap();

    assert_eq!(
        h.inbox("main").envelopes(),
        vec![Envelope::reply("1", Ok(Value::Null))]
    );
}

#[test]
fn chrome_state_goes_to_the_reconciler_per_surface() {
    let mut h = Harness::new(&["main", "sheet"]);

    h.send("main", &call(None, "chrome", "setState", json!({ "titleBar": { "text": "a" } })))
        .unwrap();
    h.send("sheet", &call(None, "chrome", "setState", json!({ "toolbar": 1 })))
        .unwrap();
    h.send("main", &call(None, "chrome", "setState", json!({})))
        .unwrap();

    assert_eq!(
        *h.log.0.borrow(),
        vec![
            r#"main:apply:titleBar:{"text":"a"}"#,
            "sheet:apply:toolbar:1",
            "main:reset:titleBar",
        ]
    );
}

#[test]
fn registered_handlers_answer_tagged_calls() {
    let mut h = Harness::new(&["main"]);
    h.bridge.handle("app", "version", |from, _| Ok(json!({ "v": "1.0", "asked_by": from })));
    h.bridge.handle("fs", "read", |_, _| Err("EACCES".to_string()));

    h.send("main", &call(Some("7"), "app", "version", Value::Null)).unwrap();
    h.send("main", &call(Some("8"), "fs", "read", json!({ "path": "/" }))).unwrap();

    assert_eq!(
        h.inbox("main").envelopes(),
        vec![
            Envelope::reply("7", Ok(json!({ "v": "1.0", "asked_by": "main" }))),
            Envelope::reply("8", Err("EACCES".into())),
        ]
    );
}

#[test]
fn unknown_method_is_a_remote_error() {
    let mut h = Harness::new(&["main"]);
    h.send("main", &call(Some("3"), "nope", "missing", Value::Null)).unwrap();

    assert_eq!(
        h.inbox("main").envelopes(),
        vec![Envelope::reply("3", Err("unknown method: nope.missing".into()))]
    );
}

#[test]
fn malformed_calls_are_rejected_immediately() {
    let mut h = Harness::new(&["main"]);

    h.send("main", r#"{"id":"9","type":"call","method":"x"}"#)
        .unwrap();
    h.send("main", "garbage").unwrap();

    let envelopes = h.inbox("main").envelopes();
    assert_eq!(envelopes.len(), 1);
    match &envelopes[0] {
        Envelope::Reply { id, error: Some(message), .. } => {
            assert_eq!(id, "9");
            assert!(message.starts_with("malformed message"));
        }
        other => panic!("expected error reply, got {other:?}"),
    }
}

#[test]
fn frames_from_closed_surfaces_are_dropped() {
    let mut h = Harness::new(&["main", "sheet"]);
    h.bridge.close_surface("sheet");
    h.inbox("main").take();

    let up = BrokerEnvelope::new(BrokerKind::PostToParent, "sheet", json!(1));
    h.send("sheet", &call(Some("1"), "broker", "postToParent", serde_json::to_value(&up).unwrap()))
        .unwrap();

    assert!(h.inbox("main").frames.borrow().is_empty());
    assert!(h.inbox("sheet").frames.borrow().is_empty());
}

#[test]
fn unregistered_handles_cannot_message_anyone() {
    let mut h = Harness::new(&["main"]);
    let ghost: Rc<dyn SurfaceHandle> = Rc::new(Inbox::default());

    let up = BrokerEnvelope::new(BrokerKind::PostToParent, "ghost", json!("boo"));
    h.bridge
        .handle_message(&ghost, &call(None, "broker", "postToParent", serde_json::to_value(&up).unwrap()))
        .unwrap();
    h.bridge
        .handle_message(&ghost, &call(None, "chrome", "setState", json!({ "titleBar": 1 })))
        .unwrap();

    assert!(h.inbox("main").frames.borrow().is_empty());
    assert!(h.log.0.borrow().is_empty());
}

#[test]
fn reply_to_a_closed_surface_is_an_error() {
    let mut h = Harness::new(&["main"]);
    let closing = Rc::new(Closing::default());
    let handle: Rc<dyn SurfaceHandle> = closing.clone();
    h.bridge.attach_surface("popover", &handle);
    closing.open.set(false);

    let err = h
        .bridge
        .handle_message(&handle, &call(Some("1"), "x", "y", Value::Null))
        .unwrap_err();
    assert!(matches!(err, HostError::SurfaceNotFound(_)));
}

#[test]
fn attach_and_close_are_announced() {
    let mut h = Harness::new(&["main"]);
    let popover = Rc::new(Inbox::default());
    let handle: Rc<dyn SurfaceHandle> = popover.clone();

    h.bridge.attach_surface("popover", &handle);
    h.bridge
        .handle_message(&handle, &call(None, "chrome", "setState", json!({ "statusBar": "x" })))
        .unwrap();
    h.bridge.close_surface("popover");

    let events: Vec<(String, Value)> = h
        .inbox("main")
        .envelopes()
        .into_iter()
        .filter_map(|e| match e {
            Envelope::Event { event, data, .. } => Some((event, data)),
            _ => None,
        })
        .collect();
    assert_eq!(
        events,
        vec![
            ("surfaceAttached".to_string(), json!({ "name": "popover" })),
            ("surfaceDetached".to_string(), json!({ "name": "popover" })),
        ]
    );
    assert_eq!(h.log.0.borrow().last().unwrap(), "popover:reset:statusBar");
}

#[test]
fn dropped_surfaces_are_pruned_and_their_chrome_reset() {
    let mut h = Harness::new(&["main", "window"]);
    h.send("window", &call(None, "chrome", "setState", json!({ "titleBar": "x" })))
        .unwrap();
    h.surfaces.retain(|(name, _, _)| name != "window");

    assert_eq!(h.bridge.prune(), vec!["window"]);
    assert_eq!(h.bridge.registry().names(), vec!["main"]);
    assert_eq!(
        *h.log.0.borrow(),
        vec![r#"window:apply:titleBar:"x""#, "window:reset:titleBar"]
    );
    assert_eq!(
        h.inbox("main").envelopes(),
        vec![Envelope::event("surfaceDetached", json!({ "name": "window" }))]
    );
    assert!(h.bridge.prune().is_empty());
}

#[test]
fn emit_all_reaches_every_surface() {
    let h = Harness::new(&["main", "a"]);
    assert_eq!(h.bridge.emit_all("themeChanged", json!("dark")), 2);
    h.bridge.emit("a", "focus", Value::Null).unwrap();
    assert_eq!(h.inbox("a").envelopes().len(), 2);
}

/// Two real bridge sessions talking through the host over channels.
#[tokio::test]
async fn sessions_round_trip_through_the_host() {
    let mut h = Harness::new(&["main", "settings"]);
    h.bridge.handle("app", "name", |_, _| Ok(json!("canopy")));

    let (main_link, mut main_out) = ChannelHost::new();
    let (settings_link, mut settings_out) = ChannelHost::new();
    let main = BridgeSession::builder()
        .identity(SurfaceIdentity::main())
        .host(main_link)
        .build();
    let settings = BridgeSession::builder()
        .identity(SurfaceIdentity::named("settings"))
        .host(settings_link)
        .build();

    let received = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&received);
    let _sub = settings.on_message(move |from, payload| {
        log.borrow_mut().push((from.to_string(), payload.clone()));
    });

    // Main declares chrome, messages the child and makes a call.
    let _sheet = main.declare([areas::sheet("settings", json!({ "presented": true }))]);
    main.run_microtasks();
    main.post_to_child("settings", json!({ "refresh": true }));
    let name = main.call("app", "name", Value::Null);

    while let Ok(frame) = main_out.try_recv() {
        h.send("main", &frame).unwrap();
    }
    for frame in h.inbox("main").take() {
        main.receive(&frame);
    }
    for frame in h.inbox("settings").take() {
        settings.receive(&frame);
    }

    assert_eq!(name.await.unwrap(), json!("canopy"));
    assert_eq!(
        *received.borrow(),
        vec![("main".to_string(), json!({ "refresh": true }))]
    );
    assert_eq!(
        *h.log.0.borrow(),
        vec![r#"main:apply:sheets:{"settings":{"presented":true}}"#]
    );
    assert!(settings_out.try_recv().is_err());
}
