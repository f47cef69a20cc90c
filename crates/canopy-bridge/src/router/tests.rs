use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;

use super::*;

fn counter() -> (Rc<Cell<usize>>, impl Fn(&BridgeEvent) + 'static) {
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    (hits, move |_: &BridgeEvent| h.set(h.get() + 1))
}

#[test]
fn typed_handler_only_sees_its_type() {
    let router = EventRouter::new();
    let (hits, handler) = counter();
    let _sub = router.on("resize", handler);

    router.emit(&BridgeEvent::new("focus", Value::Null));
    assert_eq!(hits.get(), 0);

    router.emit(&BridgeEvent::new("resize", json!({ "w": 10 })));
    assert_eq!(hits.get(), 1);
}

#[test]
fn wildcard_sees_every_type() {
    let router = EventRouter::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    let _sub = router.on_any(move |e| log.borrow_mut().push(e.kind.clone()));

    router.emit(&BridgeEvent::new("a", Value::Null));
    router.emit(&BridgeEvent::new("b", Value::Null));

    assert_eq!(*seen.borrow(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn star_is_a_wildcard_subscription() {
    let router = EventRouter::new();
    let (hits, handler) = counter();
    let _sub = router.on(WILDCARD, handler);

    router.emit(&BridgeEvent::new("anything", Value::Null));
    assert_eq!(hits.get(), 1);
    assert_eq!(router.wildcard_count(), 1);
}

#[test]
fn specific_handlers_run_before_wildcard() {
    let router = EventRouter::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    let log = Rc::clone(&order);
    let _any = router.on_any(move |_| log.borrow_mut().push("any"));
    let log = Rc::clone(&order);
    let _typed = router.on("tick", move |_| log.borrow_mut().push("typed"));

    assert_eq!(router.emit(&BridgeEvent::new("tick", Value::Null)), 2);
    assert_eq!(*order.borrow(), vec!["typed", "any"]);
}

#[test]
fn handler_receives_type_tag_and_data() {
    let router = EventRouter::new();
    let received = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&received);
    let _sub = router.on_any(move |e| *slot.borrow_mut() = Some(e.clone()));

    router.emit(&BridgeEvent::new("menu", json!({ "item": "quit" })));

    let event = received.borrow().clone().unwrap();
    assert_eq!(event.kind, "menu");
    assert_eq!(event.data, json!({ "item": "quit" }));
    assert_eq!(
        serde_json::to_value(&event).unwrap(),
        json!({ "event": "menu", "data": { "item": "quit" } })
    );
}

#[test]
fn same_handler_twice_is_two_subscriptions() {
    let router = EventRouter::new();
    let hits = Rc::new(Cell::new(0));
    let handler: Handler = {
        let h = Rc::clone(&hits);
        Rc::new(move |_: &BridgeEvent| h.set(h.get() + 1))
    };

    let first = router.on_handler("tick", Rc::clone(&handler));
    let _second = router.on_handler("tick", handler);

    router.emit(&BridgeEvent::new("tick", Value::Null));
    assert_eq!(hits.get(), 2);

    first.dispose();
    router.emit(&BridgeEvent::new("tick", Value::Null));
    assert_eq!(hits.get(), 3);
    assert_eq!(router.subscriber_count("tick"), 1);
}

#[test]
fn disposing_one_leaves_others() {
    let router = EventRouter::new();
    let (a_hits, a) = counter();
    let (b_hits, b) = counter();
    let sub_a = router.on("tick", a);
    let _sub_b = router.on("tick", b);

    sub_a.dispose();
    sub_a.dispose();
    router.emit(&BridgeEvent::new("tick", Value::Null));

    assert_eq!(a_hits.get(), 0);
    assert_eq!(b_hits.get(), 1);
}

#[test]
fn handlers_may_unsubscribe_during_dispatch() {
    let router = EventRouter::new();
    let hits = Rc::new(Cell::new(0));
    let own: Rc<RefCell<Option<Disposer>>> = Rc::new(RefCell::new(None));

    let h = Rc::clone(&hits);
    let me = Rc::clone(&own);
    let sub = router.on("once", move |_| {
        h.set(h.get() + 1);
        if let Some(d) = me.borrow().as_ref() {
            d.dispose();
        }
    });
    *own.borrow_mut() = Some(sub);

    router.emit(&BridgeEvent::new("once", Value::Null));
    router.emit(&BridgeEvent::new("once", Value::Null));
    assert_eq!(hits.get(), 1);
    assert!(router.is_empty());
}

#[test]
fn panicking_handler_does_not_starve_others() {
    let router = EventRouter::new();
    let (hits, handler) = counter();
    let _bad = router.on("boom", |_| panic!("handler failure"));
    let _good = router.on_any(handler);

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        router.emit(&BridgeEvent::new("boom", Value::Null))
    }));

    assert!(outcome.is_err());
    assert_eq!(hits.get(), 1);
}

#[test]
fn clear_makes_disposers_noops() {
    let router = EventRouter::new();
    let (hits, handler) = counter();
    let sub = router.on("tick", handler);

    router.clear();
    sub.dispose();
    let (later_hits, later) = counter();
    let _later = router.on("tick", later);

    router.emit(&BridgeEvent::new("tick", Value::Null));
    assert_eq!(hits.get(), 0);
    assert_eq!(later_hits.get(), 1);
}

#[test]
fn slot_replaces_previous_callback() {
    let router = EventRouter::new();
    let slots = CallbackSlots::new(router.clone());
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = Rc::clone(&log);
    slots.set("dismiss", Some(Rc::new(move |_: &BridgeEvent| l.borrow_mut().push("first"))));
    let l = Rc::clone(&log);
    slots.set("dismiss", Some(Rc::new(move |_: &BridgeEvent| l.borrow_mut().push("second"))));

    router.emit(&BridgeEvent::new("dismiss", Value::Null));
    assert_eq!(*log.borrow(), vec!["second"]);
    assert_eq!(router.subscriber_count("dismiss"), 1);
}

#[test]
fn slot_none_clears() {
    let router = EventRouter::new();
    let slots = CallbackSlots::new(router.clone());
    let (hits, handler) = counter();

    slots.set("dismiss", Some(Rc::new(handler)));
    assert!(slots.is_set("dismiss"));
    slots.set("dismiss", None);
    assert!(!slots.is_set("dismiss"));

    router.emit(&BridgeEvent::new("dismiss", Value::Null));
    assert_eq!(hits.get(), 0);
}

#[test]
fn slots_coexist_with_stacking_subscriptions() {
    let router = EventRouter::new();
    let slots = CallbackSlots::new(router.clone());
    let (slot_hits, slot_handler) = counter();
    let (sub_hits, sub_handler) = counter();

    let _sub = router.on("select", sub_handler);
    slots.set("select", Some(Rc::new(slot_handler)));
    slots.clear("select");
    router.emit(&BridgeEvent::new("select", Value::Null));

    assert_eq!(slot_hits.get(), 0);
    assert_eq!(sub_hits.get(), 1);
}
