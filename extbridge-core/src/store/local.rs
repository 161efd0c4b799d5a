/*
    local.rs - Local Store Adapter

    The primary extension store: one JSON object persisted as a single
    serialized blob under `storage_key` in the per-app settings backend.

    Every write loads the full map, applies the change, and rewrites the full
    map. There is no field-level persistence. Callers (the host dispatch
    queue) serialize writes, so read-modify-write cycles never interleave.
*/

use std::sync::Arc;

use metrics::counter;
use serde_json::Value;
use tracing::{trace, warn};

use super::backend::SettingsBackend;
use super::errors::StoreResult;
use super::selector::StorageSelector;
use super::StoreRecord;

/// Settings key holding the primary store blob
pub const DEFAULT_STORAGE_KEY: &str = "extbridge_storage";

pub struct LocalStore {
    backend: Arc<dyn SettingsBackend>,
    storage_key: String,
}

impl LocalStore {
    pub fn new(backend: Arc<dyn SettingsBackend>) -> Self {
        Self::with_storage_key(backend, DEFAULT_STORAGE_KEY)
    }

    pub fn with_storage_key(backend: Arc<dyn SettingsBackend>, storage_key: impl Into<String>) -> Self {
        Self {
            backend,
            storage_key: storage_key.into(),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Load the whole store. A missing or corrupted blob reads as empty.
    pub fn load(&self) -> StoreResult<StoreRecord> {
        let Some(raw) = self.backend.read(&self.storage_key)? else {
            return Ok(StoreRecord::new());
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(record)) => Ok(record),
            Ok(_) => {
                warn!(key = %self.storage_key, "Persisted store is not an object, treating as empty");
                Ok(StoreRecord::new())
            }
            Err(e) => {
                warn!(key = %self.storage_key, error = %e, "Persisted store is corrupted, treating as empty");
                Ok(StoreRecord::new())
            }
        }
    }

    fn save(&self, record: &StoreRecord) -> StoreResult<()> {
        let raw = serde_json::to_string(record)?;
        self.backend.write(&self.storage_key, &raw)
    }

    pub fn get(&self, selector: &StorageSelector) -> StoreResult<StoreRecord> {
        counter!("store.operations.read").increment(1);
        let store = self.load()?;
        Ok(selector.select(&store))
    }

    /// Shallow-merge `items` into the store (key-level overwrite)
    pub fn set(&self, items: &StoreRecord) -> StoreResult<()> {
        counter!("store.operations.write").increment(1);
        let mut store = self.load()?;
        for (key, value) in items {
            store.insert(key.clone(), value.clone());
        }
        self.save(&store)?;
        trace!(keys = items.len(), total = store.len(), "Merged items into store");
        Ok(())
    }

    /// Remove the listed keys. Returns the removed entries; absent keys are skipped.
    pub fn remove(&self, keys: &[String]) -> StoreResult<StoreRecord> {
        counter!("store.operations.delete").increment(1);
        let mut store = self.load()?;
        let removed: StoreRecord = keys
            .iter()
            .filter_map(|key| store.remove(key).map(|old| (key.clone(), old)))
            .collect();

        if !removed.is_empty() {
            self.save(&store)?;
        }
        Ok(removed)
    }

    /// Replace the store with an empty map. Returns what it held before.
    pub fn clear(&self) -> StoreResult<StoreRecord> {
        counter!("store.operations.clear").increment(1);
        let previous = self.load()?;
        self.save(&StoreRecord::new())?;
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::backend::MemorySettings;
    use crate::store::selector::parse_key_list;
    use proptest::prelude::*;
    use serde_json::json;

    fn record(value: Value) -> StoreRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn memory_store() -> (LocalStore, MemorySettings) {
        let settings = MemorySettings::new();
        (LocalStore::new(Arc::new(settings.clone())), settings)
    }

    #[test]
    fn test_set_then_get_all() {
        let (store, _) = memory_store();
        store.set(&record(json!({"a": 1}))).unwrap();
        store.set(&record(json!({"b": 2, "a": 3}))).unwrap();

        let all = store.get(&StorageSelector::All).unwrap();
        assert_eq!(Value::Object(all), json!({"a": 3, "b": 2}));
    }

    #[test]
    fn test_set_is_shallow() {
        let (store, _) = memory_store();
        store.set(&record(json!({"cfg": {"x": 1, "y": 2}}))).unwrap();
        store.set(&record(json!({"cfg": {"x": 5}}))).unwrap();

        let all = store.get(&StorageSelector::All).unwrap();
        assert_eq!(Value::Object(all), json!({"cfg": {"x": 5}}));
    }

    #[test]
    fn test_get_subset_and_defaults() {
        let (store, _) = memory_store();
        store.set(&record(json!({"a": 1}))).unwrap();

        let subset = store.get(&StorageSelector::parse(r#"["a","missing"]"#)).unwrap();
        assert_eq!(Value::Object(subset), json!({"a": 1}));

        let defaults = store
            .get(&StorageSelector::parse(r#"{"a":"default","b":"default"}"#))
            .unwrap();
        assert_eq!(Value::Object(defaults), json!({"a": 1, "b": "default"}));
    }

    #[test]
    fn test_remove() {
        let (store, _) = memory_store();
        store.set(&record(json!({"a": 1, "b": 2}))).unwrap();

        let removed = store.remove(&parse_key_list(r#"["a","ghost"]"#)).unwrap();
        assert_eq!(Value::Object(removed), json!({"a": 1}));

        let all = store.get(&StorageSelector::All).unwrap();
        assert_eq!(Value::Object(all), json!({"b": 2}));
    }

    #[test]
    fn test_clear() {
        let (store, _) = memory_store();
        store.set(&record(json!({"a": 1, "b": 2}))).unwrap();

        let previous = store.clear().unwrap();
        assert_eq!(previous.len(), 2);
        assert!(store.get(&StorageSelector::All).unwrap().is_empty());
    }

    #[test]
    fn test_persisted_as_single_blob() {
        let (store, settings) = memory_store();
        store.set(&record(json!({"a": 1}))).unwrap();

        let raw = settings.read(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        assert_eq!(serde_json::from_str::<Value>(&raw).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_corrupted_blob_reads_empty() {
        let (store, settings) = memory_store();
        settings.write(DEFAULT_STORAGE_KEY, "[1,2,3]").unwrap();
        assert!(store.load().unwrap().is_empty());

        settings.write(DEFAULT_STORAGE_KEY, "{truncated").unwrap();
        assert!(store.load().unwrap().is_empty());

        store.set(&record(json!({"fresh": true}))).unwrap();
        assert_eq!(Value::Object(store.load().unwrap()), json!({"fresh": true}));
    }

    proptest! {
        #[test]
        fn prop_get_all_is_shallow_merge_of_sets(
            writes in prop::collection::vec(
                prop::collection::btree_map("[a-e]", any::<i64>(), 0..4),
                0..8,
            )
        ) {
            let (store, _) = memory_store();
            let mut expected = StoreRecord::new();

            for write in &writes {
                let items: StoreRecord = write
                    .iter()
                    .map(|(k, v)| (k.clone(), json!(v)))
                    .collect();
                store.set(&items).unwrap();
                for (k, v) in items {
                    expected.insert(k, v);
                }
            }

            prop_assert_eq!(store.get(&StorageSelector::All).unwrap(), expected);
        }
    }
}
