//! Integration tests for wc-store

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use wc_store::{
    AbortController, FileStorage, Lifecycle, MemoryStorage, PersistenceOptions, Storage,
    StorageArea, Store, StoreComposer, StoreError,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct State {
    count: i32,
    name: String,
}

fn state(count: i32, name: &str) -> State {
    State {
        count,
        name: name.to_string(),
    }
}

#[test]
fn snapshot_immutability() {
    let store = Store::new(json!({ "list": [1, 2, 3], "meta": { "ok": true } })).unwrap();

    let mut current = store.get_current();
    current["list"] = json!([]);
    current["meta"]["ok"] = json!(false);

    let mut previous = store.get_previous();
    previous["extra"] = json!(1);

    assert_eq!(
        store.get_current(),
        json!({ "list": [1, 2, 3], "meta": { "ok": true } })
    );
    assert_eq!(store.get_previous(), store.get_current());
}

#[test]
fn update_ordering() {
    let store = Store::new(state(1, "v1")).unwrap();

    store.set_state(state(2, "v2"));
    assert_eq!(store.get_previous(), state(1, "v1"));
    assert_eq!(store.get_current(), state(2, "v2"));

    store.set_state(state(3, "v3"));
    assert_eq!(store.get_previous(), state(2, "v2"));
    assert_eq!(store.get_current(), state(3, "v3"));
}

#[test]
fn subscriber_fan_out_and_cancellation() {
    let store = Store::new(state(0, "x")).unwrap();
    let controller = AbortController::new();
    let calls = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second"] {
        let calls = calls.clone();
        store.on_change(&controller.signal(), move |current: &State, _: &State| {
            calls.lock().unwrap().push((name, current.count));
        });
    }

    store.set_state(state(1, "x"));
    store.set_state(state(2, "x"));
    assert_eq!(
        *calls.lock().unwrap(),
        vec![("first", 1), ("second", 1), ("first", 2), ("second", 2)]
    );

    controller.abort();
    assert_eq!(store.subscriber_count(), 0);

    store.set_state(state(3, "x"));
    assert_eq!(calls.lock().unwrap().len(), 4);
    assert_eq!(store.get_current().count, 3);
}

#[test]
fn lifecycle_tears_down_component_subscriptions() {
    let store = Store::new(state(0, "x")).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    {
        let component = Lifecycle::new();
        let calls = calls.clone();
        store.on_change(&component.signal(), move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        store.update(|s| s.count += 1);
    }

    store.update(|s| s.count += 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn persistence_round_trip() {
    let storage = Storage::in_memory();
    let options = PersistenceOptions::new("p").durable("k");

    Store::with_storage(json!({ "a": 1 }), storage.clone(), options.clone()).unwrap();
    let rehydrated =
        Store::with_storage(json!({ "something": "else" }), storage, options).unwrap();

    assert_eq!(rehydrated.get_current(), json!({ "a": 1 }));
}

#[test]
fn persistence_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("durable.json");
    let options = PersistenceOptions::new("p").durable("k");

    {
        let durable = Arc::new(FileStorage::open(&path).unwrap());
        let storage = Storage::new(durable, Arc::new(MemoryStorage::new()));
        let store = Store::with_storage(state(0, "start"), storage, options.clone()).unwrap();
        store.update(|s| s.count = 9);
    }

    let durable = Arc::new(FileStorage::open(&path).unwrap());
    let storage = Storage::new(durable, Arc::new(MemoryStorage::new()));
    let store = Store::with_storage(state(0, "default"), storage, options).unwrap();
    assert_eq!(store.get_current(), state(9, "start"));
}

#[test]
fn corruption_fallback() {
    let storage = Storage::in_memory();
    storage.durable().set_item("p/k", "this is not json").unwrap();

    let options = PersistenceOptions::new("p").durable("k");
    let store = Store::with_storage(json!({ "a": 0 }), storage.clone(), options).unwrap();

    assert_eq!(store.get_current(), json!({ "a": 0 }));
    assert_eq!(
        storage.durable().get_item("p/k").unwrap().as_deref(),
        Some(r#"{"a":0}"#)
    );
}

#[test]
fn composer_key_recovery() {
    let storage = Storage::in_memory();
    let options = PersistenceOptions::new("p").durable("composer");

    {
        let composer =
            StoreComposer::with_storage([("x", json!({}))], storage.clone(), options.clone())
                .unwrap();
        composer.create_store("y", json!({})).unwrap();
    }

    let composer = StoreComposer::with_storage([("x", json!({}))], storage, options).unwrap();
    assert_eq!(composer.keys(), vec!["x", "y"]);
    assert!(composer.get_store("x").is_ok());
    assert!(composer.get_store("y").is_ok());
}

#[test]
fn session_scoped_composer() {
    let storage = Storage::in_memory();
    let options = PersistenceOptions::new("p").session("tabs");

    let composer =
        StoreComposer::with_storage([("main", state(0, "main"))], storage.clone(), options)
            .unwrap();
    composer.get_store("main").unwrap().update(|s| s.count = 3);

    assert!(storage.durable().keys().unwrap().is_empty());
    assert_eq!(
        storage.session().get_item("p/tabs/main").unwrap().as_deref(),
        Some(r#"{"count":3,"name":"main"}"#)
    );
}

#[test]
fn validation_rejection() {
    let err = Store::new(42).unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(err, StoreError::InvalidState { found: "number" }));

    let err = Store::new(vec![1, 2, 3]).unwrap_err();
    assert!(matches!(err, StoreError::InvalidState { found: "array" }));

    let err = StoreComposer::new([("bad", json!("text"))]).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn composer_lookup_error() {
    let composer = StoreComposer::new([("a", json!({}))]).unwrap();
    let err = composer.get_store("b").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert_eq!(err.to_string(), "the store with key `b` does not exist");
}

#[test]
fn heterogeneous_children() {
    let composer = StoreComposer::<Value>::new([
        ("user", json!({ "name": "Ada" })),
        ("cart", json!({ "items": [1, 2] })),
    ])
    .unwrap();
    let controller = AbortController::new();
    let updates = Arc::new(AtomicUsize::new(0));

    let updates_clone = updates.clone();
    composer.subscribe_to_all(&controller.signal(), move |_, _, _| {
        updates_clone.fetch_add(1, Ordering::SeqCst);
    });

    composer
        .get_store("cart")
        .unwrap()
        .merge(&json!({ "items": [] }))
        .unwrap();

    assert_eq!(updates.load(Ordering::SeqCst), 1);
    assert_eq!(
        composer.get_store("user").unwrap().get_current(),
        json!({ "name": "Ada" })
    );
}
