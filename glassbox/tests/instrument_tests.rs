//! Instrumentation integration tests

mod common;

use std::sync::Arc;

use glassbox::{
    instrument, observe_fn, Completion, EventKind, EventLog, InstrumentOptions, Object,
    ObserverResult, Path, PropertyKey, ProxyHandler, Session, Symbol, Thrown, Value,
};
use serde_json::json;

use common::{get, get_path, init_tracing};

fn profile() -> Value {
    Value::from_json(&json!({
        "public": { "id": 7, "name": "Ada", "secretField": "s3cr3t" },
        "private": { "key": "k" },
        "address": { "city": "Boston", "zip": "02101" },
        "tags": ["admin", "ops"]
    }))
}

fn trail(log: &EventLog) -> Vec<(EventKind, String)> {
    log.trail()
}

fn entry(kind: EventKind, accessor: &str) -> (EventKind, String) {
    (kind, accessor.to_string())
}

#[test]
fn test_non_objects_are_returned_unchanged() {
    let log = EventLog::new();
    let wrapped = instrument(Value::from(5), log.clone(), InstrumentOptions::default());
    assert_eq!(wrapped, Value::from(5));
    assert!(log.is_empty());
}

#[test]
fn test_disabled_is_identity() {
    let log = EventLog::new();
    let target = profile();
    let wrapped = instrument(target.clone(), log.clone(), InstrumentOptions::disabled());
    assert_eq!(wrapped, target);
    get(&wrapped, "public");
    assert!(log.is_empty());
}

#[test]
fn test_nested_reads_are_reported_with_paths() {
    let log = EventLog::new();
    let wrapped = instrument(profile(), log.clone(), InstrumentOptions::default());

    assert_eq!(get_path(&wrapped, "public.name"), Value::from("Ada"));
    assert_eq!(get_path(&wrapped, "tags.1"), Value::from("ops"));

    assert_eq!(
        trail(&log),
        vec![
            entry(EventKind::Get, "public"),
            entry(EventKind::Get, "public.name"),
            entry(EventKind::Get, "tags"),
            entry(EventKind::Get, "tags[1]"),
        ]
    );

    let events = log.events();
    assert_eq!(events[1].key, Some(PropertyKey::from("name")));
    assert_eq!(events[1].result, Some(Value::from("Ada")));
    assert!(!events[1].is_deferred);
    assert!(events[1].error.is_none());
}

#[test]
fn test_event_exposes_unwrapped_values() {
    let log = EventLog::new();
    let target = profile();
    let wrapped = instrument(target.clone(), log.clone(), InstrumentOptions::default());

    let public = get(&wrapped, "public");
    let raw_public = get(&target, "public");
    assert_ne!(public, raw_public);

    let event = &log.events()[0];
    assert_eq!(event.result, Some(raw_public));
    assert_eq!(Some(&event.target), target.as_object());
}

#[test]
fn test_idempotent_wrapping() {
    let log = EventLog::new();
    let wrapped = instrument(profile(), log.clone(), InstrumentOptions::default());

    let first = get(&wrapped, "address");
    let second = get(&wrapped, "address");
    assert_eq!(first, second);

    let session = Session::new(EventLog::new(), &InstrumentOptions::default());
    let original = Value::from(Object::new());
    assert_eq!(session.instrument(original.clone()), session.instrument(original));
}

#[test]
fn test_cycles_terminate() {
    init_tracing();
    let a = Object::new();
    let b = Object::new();
    a.insert("b", b.clone());
    b.insert("a", a.clone());

    let log = EventLog::new();
    let wrapped = instrument(Value::from(a.clone()), log.clone(), InstrumentOptions::default());

    let back = get_path(&wrapped, "b.a");
    assert_eq!(back, wrapped);
    let again = get_path(&wrapped, "b.a.b.a.b");
    assert_eq!(again, get(&wrapped, "b"));
    assert_eq!(log.events()[1].accessor(), "b.a");
}

#[test]
fn test_transparency() {
    let target = profile();
    let wrapped = instrument(target.clone(), EventLog::new(), InstrumentOptions::default());
    assert_eq!(wrapped.to_json(), target.to_json());

    let obj = wrapped.as_object().unwrap();
    assert!(obj.has("public").unwrap());
    assert!(!obj.has("missing").unwrap());
    assert_eq!(obj.get("missing").unwrap(), Value::Undefined);
    assert_eq!(
        obj.own_keys().unwrap(),
        target.as_object().unwrap().own_keys().unwrap()
    );
}

#[test]
fn test_forwarded_operations_are_silent() {
    let log = EventLog::new();
    let wrapped = instrument(profile(), log.clone(), InstrumentOptions::default());
    let obj = wrapped.as_object().unwrap();

    obj.has("public").unwrap();
    obj.own_keys().unwrap();
    obj.get_own_property("public").unwrap();
    obj.define_property("added", glassbox::PropertyDescriptor::data(1)).unwrap();

    assert!(log.is_empty());
}

#[test]
fn test_filtering_include_and_exclude() {
    let log = EventLog::new();
    let options = InstrumentOptions::default().with_include(["public"]);
    let wrapped = instrument(profile(), log.clone(), options);

    get_path(&wrapped, "public.id");
    get_path(&wrapped, "private.key");
    assert_eq!(
        trail(&log),
        vec![entry(EventKind::Get, "public"), entry(EventKind::Get, "public.id")]
    );

    let log = EventLog::new();
    let options = InstrumentOptions::default()
        .with_include(["public"])
        .with_exclude(["public.secretField"]);
    let wrapped = instrument(profile(), log.clone(), options);

    get_path(&wrapped, "public.secretField");
    get_path(&wrapped, "public.name");
    assert_eq!(
        trail(&log),
        vec![
            entry(EventKind::Get, "public"),
            entry(EventKind::Get, "public"),
            entry(EventKind::Get, "public.name"),
        ]
    );
}

#[test]
fn test_filtered_paths_still_behave() {
    let options = InstrumentOptions::default().with_include(["nothing"]);
    let log = EventLog::new();
    let wrapped = instrument(profile(), log.clone(), options);

    assert_eq!(get_path(&wrapped, "address.city"), Value::from("Boston"));
    assert!(log.is_empty());
}

#[test]
fn test_depth_limit_zero() {
    let log = EventLog::new();
    let target = profile();
    let wrapped = instrument(
        target.clone(),
        log.clone(),
        InstrumentOptions::default().with_depth_limit(0),
    );
    assert_ne!(wrapped, target);

    let address = get(&wrapped, "address");
    assert_eq!(address, get(&target, "address"));

    get(&address, "city");
    assert_eq!(trail(&log), vec![entry(EventKind::Get, "address")]);
}

#[test]
fn test_write_reporting() {
    let log = EventLog::new();
    let target = profile();
    let wrapped = instrument(target.clone(), log.clone(), InstrumentOptions::default());

    let address = get(&wrapped, "address");
    assert!(address.as_object().unwrap().set("city", "New York").unwrap());

    let sets = log.of_kind(EventKind::Set);
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].accessor(), "address.city");
    assert_eq!(sets[0].value, Some(Value::from("New York")));
    assert!(sets[0].error.is_none());
    assert_eq!(get_path(&target, "address.city"), Value::from("New York"));
}

#[test]
fn test_refused_write_is_still_reported() {
    let log = EventLog::new();
    let target = Object::new();
    target.insert("locked", 1);
    target.freeze();
    let wrapped = instrument(Value::from(target.clone()), log.clone(), InstrumentOptions::default());

    assert!(!wrapped.as_object().unwrap().set("locked", 2).unwrap());
    assert_eq!(trail(&log), vec![entry(EventKind::Set, "locked")]);
    assert_eq!(target.get("locked").unwrap(), Value::from(1));
}

#[test]
fn test_delete_reported_before_deletion() {
    let target = Object::new();
    target.insert("temp", 1);
    let probe = target.clone();
    let seen_before_delete = Arc::new(parking_lot::Mutex::new(None));
    let seen = seen_before_delete.clone();
    let observer = observe_fn(move |event| {
        *seen.lock() = Some(probe.has("temp").unwrap());
        assert_eq!(event.kind, EventKind::DeleteProperty);
    });

    let wrapped = instrument(Value::from(target.clone()), observer, InstrumentOptions::default());
    assert!(wrapped.as_object().unwrap().delete("temp").unwrap());

    assert_eq!(*seen_before_delete.lock(), Some(true));
    assert!(!target.has("temp").unwrap());
}

#[test]
fn test_calls_wrap_sync_results() {
    let api = Object::new();
    api.insert(
        "user",
        Object::function("user", |_this, args| {
            Ok(Value::from_json(&json!({ "id": args.first().and_then(Value::as_f64) })))
        }),
    );

    let log = EventLog::new();
    let wrapped = instrument(Value::from(api), log.clone(), InstrumentOptions::default());

    let user = wrapped.as_object().unwrap().invoke("user", &[Value::from(3)]).unwrap();
    assert_eq!(get(&user, "id"), Value::from(3));

    assert_eq!(
        trail(&log),
        vec![
            entry(EventKind::Get, "user"),
            entry(EventKind::Apply, "user"),
            entry(EventKind::Get, "user[sync-result].id"),
        ]
    );
    let apply = &log.of_kind(EventKind::Apply)[0];
    assert_eq!(apply.args, Some(vec![Value::from(3)]));
    assert!(!apply.is_deferred);
}

#[test]
fn test_construct_wraps_instances() {
    let proto = Object::new();
    proto.insert(
        "double",
        Object::function("double", |this, _| {
            let n = match this.as_object() {
                Some(me) => me.get("n")?.as_f64().unwrap_or(0.0),
                None => 0.0,
            };
            Ok(Value::from(n * 2.0))
        }),
    );
    let class = Object::class("Num", proto, |me, args| {
        me.insert("n", args.first().cloned().unwrap_or_default());
        Ok(())
    });
    let module = Object::new();
    module.insert("Num", class);

    let log = EventLog::new();
    let wrapped = instrument(Value::from(module), log.clone(), InstrumentOptions::default());

    let num = get(&wrapped, "Num");
    let instance = num.as_object().unwrap().construct(&[Value::from(21)]).unwrap();
    assert_eq!(
        instance.as_object().unwrap().invoke("double", &[]).unwrap(),
        Value::from(42)
    );

    assert_eq!(
        trail(&log),
        vec![
            entry(EventKind::Get, "Num"),
            entry(EventKind::Construct, "Num"),
            entry(EventKind::Get, "Num[constructed].double"),
            entry(EventKind::Get, "Num[constructed].n"),
            entry(EventKind::Apply, "Num[constructed].double"),
        ]
    );
    let construct = &log.of_kind(EventKind::Construct)[0];
    assert_eq!(construct.args, Some(vec![Value::from(21)]));
    assert!(construct.result.as_ref().and_then(Value::as_object).is_some());
}

#[test]
fn test_call_failures_are_reported_and_rethrown() {
    let api = Object::new();
    api.insert(
        "explode",
        Object::function("explode", |_, _| Err(Thrown::new("bad input"))),
    );

    let log = EventLog::new();
    let wrapped = instrument(Value::from(api), log.clone(), InstrumentOptions::default());

    let err = wrapped.as_object().unwrap().invoke("explode", &[Value::from(1)]).unwrap_err();
    assert_eq!(err, Thrown::new("bad input"));

    let apply = &log.of_kind(EventKind::Apply)[0];
    assert_eq!(apply.error, Some(Value::from("bad input")));
    assert!(apply.result.is_none());
    assert_eq!(apply.args, Some(vec![Value::from(1)]));
}

struct ThrowingReads;

impl ProxyHandler for ThrowingReads {
    fn get(&self, target: &Object, key: &PropertyKey) -> Completion {
        if key == &PropertyKey::from("boom") {
            return Err(Thrown::new("read failed"));
        }
        target.get(key)
    }
}

#[test]
fn test_read_failures_are_reported_and_rethrown() {
    let inner = Object::new();
    inner.insert("fine", 1);
    let hostile = Object::proxy(&inner, Arc::new(ThrowingReads)).unwrap();

    let log = EventLog::new();
    let wrapped = instrument(Value::from(hostile), log.clone(), InstrumentOptions::default());
    let obj = wrapped.as_object().unwrap();

    assert_eq!(obj.get("fine").unwrap(), Value::from(1));
    assert_eq!(obj.get("boom").unwrap_err(), Thrown::new("read failed"));

    let events = log.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].accessor(), "boom");
    assert_eq!(events[1].error, Some(Value::from("read failed")));
    assert!(events[1].result.is_none());
}

#[test]
fn test_reserved_keys_are_reported_but_not_wrapped() {
    let iterator_impl = Object::new();
    let meta = Object::new();
    let target = Object::new();
    target.insert(Symbol::iterator(), iterator_impl.clone());
    target.insert("__meta", meta.clone());
    target.insert("plain", Object::new());

    let log = EventLog::new();
    let wrapped = instrument(Value::from(target), log.clone(), InstrumentOptions::default());
    let obj = wrapped.as_object().unwrap();

    assert_eq!(obj.get(Symbol::iterator()).unwrap(), Value::from(iterator_impl));
    assert_eq!(obj.get("__meta").unwrap(), Value::from(meta));
    assert!(obj.get("plain").unwrap().as_object().unwrap().is_proxy());

    assert_eq!(
        trail(&log),
        vec![
            entry(EventKind::Get, "[Symbol.iterator]"),
            entry(EventKind::Get, "__meta"),
            entry(EventKind::Get, "plain"),
        ]
    );
}

#[test]
fn test_unproxyable_values_degrade_gracefully() {
    let sealed = Object::new();
    sealed.insert("x", 1);
    sealed.set_proxyable(false);

    let log = EventLog::new();
    let root = instrument(Value::from(sealed.clone()), log.clone(), InstrumentOptions::default());
    assert_eq!(root, Value::from(sealed.clone()));

    let holder = Object::new();
    holder.insert("sealed", sealed.clone());
    let session = Session::new(log.clone(), &InstrumentOptions::default());
    let wrapped = session.instrument(Value::from(holder));

    assert_eq!(get(&wrapped, "sealed"), Value::from(sealed));
    assert_eq!(session.stats().wrap_degradations, 1);
    assert_eq!(log.len(), 1);
}

#[test]
fn test_observer_isolation() {
    init_tracing();
    let build = || {
        let api = Object::new();
        api.insert("value", 10);
        api.insert(
            "add",
            Object::function("add", |_, args| {
                let sum: f64 = args.iter().filter_map(Value::as_f64).sum();
                Ok(Value::from(sum))
            }),
        );
        api.insert("fail", Object::function("fail", |_, _| Err(Thrown::new("nope"))));
        Value::from(api)
    };

    let failing = |_: &glassbox::Event| -> ObserverResult { Err("observer broke".into()) };
    let panicking = observe_fn(|_| panic!("observer panicked"));

    let quiet = instrument(build(), EventLog::new(), InstrumentOptions::default());
    let erroring = instrument(build(), failing, InstrumentOptions::default());
    let session = Session::new(panicking, &InstrumentOptions::default());
    let exploding = session.instrument(build());

    for wrapped in [&quiet, &erroring, &exploding] {
        let obj = wrapped.as_object().unwrap();
        assert_eq!(obj.get("value").unwrap(), Value::from(10));
        assert_eq!(
            obj.invoke("add", &[Value::from(1), Value::from(2)]).unwrap(),
            Value::from(3)
        );
        assert_eq!(obj.invoke("fail", &[]).unwrap_err(), Thrown::new("nope"));
        assert!(obj.set("value", 11).unwrap());
        assert!(obj.delete("value").unwrap());
    }

    let stats = session.stats();
    assert_eq!(stats.observer_failures, stats.events_emitted);
    assert!(stats.observer_failures > 0);
}

#[test]
fn test_accessor_rendering_in_events() {
    let target = Value::from_json(&json!({ "headers": { "content-type": "json" }, "user-name": "ada" }));
    let log = EventLog::new();
    let wrapped = instrument(target, log.clone(), InstrumentOptions::default());

    get_path(&wrapped, "headers.content-type");
    get(&wrapped, "user-name");

    assert_eq!(
        trail(&log),
        vec![
            entry(EventKind::Get, "headers"),
            entry(EventKind::Get, r#"headers["content-type"]"#),
            entry(EventKind::Get, r#"["user-name"]"#),
        ]
    );
    let path: Path = ["a", "b"].into_iter().collect();
    assert_eq!(path.child(2u32).child("c").render(), "a.b[2].c");
}

#[test]
fn test_session_stats() {
    let session = Session::builder()
        .observer(EventLog::new())
        .exclude("private")
        .build()
        .unwrap();
    let wrapped = session.instrument(profile());

    get_path(&wrapped, "public.id");
    get_path(&wrapped, "private.key");

    let stats = session.stats();
    assert_eq!(stats.events_emitted, 2);
    assert_eq!(stats.events_filtered, 2);
    assert_eq!(stats.wrappers_created, 3);
    assert_eq!(stats.observer_failures, 0);
}

#[test]
fn test_event_summary_serializes() {
    let log = EventLog::new();
    let wrapped = instrument(profile(), log.clone(), InstrumentOptions::default());
    get_path(&wrapped, "address.city");

    let summary = log.events()[1].summary();
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["kind"], "get");
    assert_eq!(json["accessor"], "address.city");
    assert_eq!(json["result"], "Boston");
    assert_eq!(json["is_deferred"], false);
}
