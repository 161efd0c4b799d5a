//! Shared metadata replica
//!
//! The sanitized profile list, readable by companion apps. Stored as one JSON
//! array under a single key in a shared settings backend and replaced whole
//! on every write.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::store::{SettingsBackend, StoreResult};

/// Shared settings key holding the profile metadata array
pub const DEFAULT_SHARED_PROFILES_KEY: &str = "shared_profiles";

pub struct MetadataStore {
    backend: Arc<dyn SettingsBackend>,
    key: String,
}

impl MetadataStore {
    pub fn new(backend: Arc<dyn SettingsBackend>) -> Self {
        Self::with_key(backend, DEFAULT_SHARED_PROFILES_KEY)
    }

    pub fn with_key(backend: Arc<dyn SettingsBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Replace the replica with `profiles`
    pub fn save_profiles(&self, profiles: &[Value]) -> StoreResult<()> {
        let raw = serde_json::to_string(profiles)?;
        self.backend.write(&self.key, &raw)
    }

    /// Read the replica. Missing or unreadable content reads as empty.
    pub fn load_profiles(&self) -> StoreResult<Vec<Value>> {
        let Some(raw) = self.backend.read(&self.key)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(profiles) => Ok(profiles),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Shared profile metadata is corrupted");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySettings;
    use serde_json::json;

    #[test]
    fn test_full_replace() {
        let settings = MemorySettings::new();
        let store = MetadataStore::new(Arc::new(settings.clone()));

        store.save_profiles(&[json!({"id": "a"}), json!({"id": "b"})]).unwrap();
        store.save_profiles(&[json!({"id": "c"})]).unwrap();

        assert_eq!(store.load_profiles().unwrap(), vec![json!({"id": "c"})]);
        assert!(settings.read(DEFAULT_SHARED_PROFILES_KEY).unwrap().is_some());
    }

    #[test]
    fn test_missing_and_corrupted_read_empty() {
        let settings = MemorySettings::new();
        let store = MetadataStore::with_key(Arc::new(settings.clone()), "meta");
        assert!(store.load_profiles().unwrap().is_empty());

        settings.write("meta", "{not json").unwrap();
        assert!(store.load_profiles().unwrap().is_empty());
    }
}
