/*
    Storage Integration Tests

    storage.local through a live host:
    - get / set / remove / clear semantics
    - change notifications reach both contexts exactly once
    - persistence across host restarts with file-backed settings
*/

mod common;

use std::sync::Arc;

use common::{memory_builder, next, start, watch_changes};
use extbridge_core::bridge::BridgeHostBuilder;
use extbridge_core::store::{FileSettings, LocalStore, StorageSelector, StoreRecord};
use serde_json::{json, Value};

fn record(value: Value) -> StoreRecord {
    value.as_object().cloned().expect("object literal")
}

#[tokio::test]
async fn test_set_then_get_selectors() {
    let bridge = start(memory_builder());
    let storage = bridge.ui.storage();

    storage.set(record(json!({"a": 1}))).await.unwrap();
    storage.set(record(json!({"b": {"nested": [1, 2]}, "a": 3}))).await.unwrap();

    let everything = storage.get(StorageSelector::All).await.unwrap();
    assert_eq!(Value::Object(everything), json!({"a": 3, "b": {"nested": [1, 2]}}));

    let subset = storage.get(&["a", "missing"][..]).await.unwrap();
    assert_eq!(Value::Object(subset), json!({"a": 3}));

    let single = storage.get("b").await.unwrap();
    assert_eq!(Value::Object(single), json!({"b": {"nested": [1, 2]}}));

    let with_defaults = storage
        .get(record(json!({"a": "default", "z": "default"})))
        .await
        .unwrap();
    assert_eq!(Value::Object(with_defaults), json!({"a": 3, "z": "default"}));

    bridge.stop().await;
}

#[tokio::test]
async fn test_remove_and_clear() {
    let bridge = start(memory_builder());
    let storage = bridge.background.storage();

    storage.set(record(json!({"a": 1, "b": 2}))).await.unwrap();
    storage.remove(["a"]).await.unwrap();
    assert_eq!(
        Value::Object(storage.get(StorageSelector::All).await.unwrap()),
        json!({"b": 2})
    );

    storage.clear().await.unwrap();
    assert!(storage.get(StorageSelector::All).await.unwrap().is_empty());

    bridge.stop().await;
}

#[tokio::test]
async fn test_both_contexts_notified_once_per_write() {
    let bridge = start(memory_builder());
    let mut ui_changes = watch_changes(&bridge.ui);
    let mut bg_changes = watch_changes(&bridge.background);

    bridge.ui.storage().set(record(json!({"theme": "dark"}))).await.unwrap();

    for rx in [&mut ui_changes, &mut bg_changes] {
        let (changes, area) = next(rx).await;
        assert_eq!(area, "local");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get("theme").unwrap().new_value, Some(json!("dark")));
        assert!(rx.try_recv().is_err());
    }

    bridge.stop().await;
}

#[tokio::test]
async fn test_removal_notifications_carry_old_values() {
    let bridge = start(memory_builder());
    bridge
        .ui
        .storage()
        .set(record(json!({"a": 1, "b": 2})))
        .await
        .unwrap();

    let mut changes = watch_changes(&bridge.background);

    bridge.ui.storage().remove(["a", "ghost"]).await.unwrap();
    let (removed, _) = next(&mut changes).await;
    assert_eq!(removed.len(), 1);
    assert_eq!(removed.get("a").unwrap().old_value, Some(json!(1)));

    bridge.ui.storage().clear().await.unwrap();
    let (cleared, _) = next(&mut changes).await;
    assert_eq!(cleared.get("b").unwrap().old_value, Some(json!(2)));

    bridge.ui.storage().clear().await.unwrap();
    bridge.ui.storage().get(StorageSelector::All).await.unwrap();
    assert!(changes.try_recv().is_err());

    bridge.stop().await;
}

#[tokio::test]
async fn test_store_survives_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    let open = || {
        let settings = FileSettings::open(dir.path()).unwrap();
        BridgeHostBuilder::new(LocalStore::new(Arc::new(settings)))
    };

    let bridge = start(open());
    bridge
        .ui
        .storage()
        .set(record(json!({"profiles": [], "relays": ["wss://relay.example"]})))
        .await
        .unwrap();
    bridge.stop().await;

    let bridge = start(open());
    let relays = bridge.background.storage().get("relays").await.unwrap();
    assert_eq!(Value::Object(relays), json!({"relays": ["wss://relay.example"]}));
    bridge.stop().await;
}
