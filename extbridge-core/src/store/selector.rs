//! Overloaded `get` selector and key-list parsing
//!
//! `storage.local.get` accepts nothing, a single key, a list of keys, or a
//! map of key → default. The selector arrives JSON-encoded in the envelope's
//! `data` field.

use serde_json::{Map, Value};
use tracing::debug;

use super::StoreRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum StorageSelector {
    /// Whole store
    All,
    /// `{key: value}` if present, `{}` otherwise
    Key(String),
    /// Present subset of the listed keys
    Keys(Vec<String>),
    /// Every listed key, falling back to its default when absent
    Defaults(StoreRecord),
}

impl StorageSelector {
    /// Decode selector data. Anything unrecognised selects nothing.
    pub fn parse(data: &str) -> Self {
        let trimmed = data.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return StorageSelector::All;
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => Self::from_value(value),
            Err(e) => {
                debug!(error = %e, "Unparseable storage selector, selecting nothing");
                StorageSelector::Keys(Vec::new())
            }
        }
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => StorageSelector::All,
            Value::String(key) => StorageSelector::Key(key),
            Value::Array(items) => StorageSelector::Keys(string_items(items)),
            Value::Object(defaults) => StorageSelector::Defaults(defaults),
            other => {
                debug!(selector = %other, "Unsupported storage selector, selecting nothing");
                StorageSelector::Keys(Vec::new())
            }
        }
    }

    /// JSON encoding used on the wire
    pub fn to_data(&self) -> String {
        match self {
            StorageSelector::All => Value::Null.to_string(),
            StorageSelector::Key(key) => Value::String(key.clone()).to_string(),
            StorageSelector::Keys(keys) => Value::from(keys.clone()).to_string(),
            StorageSelector::Defaults(defaults) => Value::Object(defaults.clone()).to_string(),
        }
    }

    /// Apply the selector to a loaded store
    pub fn select(&self, store: &StoreRecord) -> StoreRecord {
        match self {
            StorageSelector::All => store.clone(),
            StorageSelector::Key(key) => pick(store, std::iter::once(key)),
            StorageSelector::Keys(keys) => pick(store, keys.iter()),
            StorageSelector::Defaults(defaults) => defaults
                .iter()
                .map(|(key, default)| {
                    let value = store.get(key).unwrap_or(default).clone();
                    (key.clone(), value)
                })
                .collect(),
        }
    }
}

impl From<&str> for StorageSelector {
    fn from(key: &str) -> Self {
        StorageSelector::Key(key.to_string())
    }
}

impl From<Vec<String>> for StorageSelector {
    fn from(keys: Vec<String>) -> Self {
        StorageSelector::Keys(keys)
    }
}

impl From<&[&str]> for StorageSelector {
    fn from(keys: &[&str]) -> Self {
        StorageSelector::Keys(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl From<Map<String, Value>> for StorageSelector {
    fn from(defaults: Map<String, Value>) -> Self {
        StorageSelector::Defaults(defaults)
    }
}

/// Decode the key list of a `remove` call: an array of keys or one key.
pub fn parse_key_list(data: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::Array(items)) => string_items(items),
        Ok(Value::String(key)) => vec![key],
        Ok(other) => {
            debug!(keys = %other, "Unsupported key list, removing nothing");
            Vec::new()
        }
        Err(e) => {
            debug!(error = %e, "Unparseable key list, removing nothing");
            Vec::new()
        }
    }
}

fn string_items(items: Vec<Value>) -> Vec<String> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect()
}

fn pick<'a>(store: &StoreRecord, keys: impl Iterator<Item = &'a String>) -> StoreRecord {
    keys.filter_map(|key| store.get(key).map(|value| (key.clone(), value.clone())))
        .collect()
}
