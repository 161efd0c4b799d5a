//! Primary key-value store
//!
//! A single JSON object mirroring `storage.local`, persisted through a
//! [`SettingsBackend`].

pub mod backend;
pub mod errors;
pub mod local;
pub mod selector;

pub use backend::{FileSettings, MemorySettings, SettingsBackend};
pub use errors::{StoreError, StoreResult};
pub use local::{LocalStore, DEFAULT_STORAGE_KEY};
pub use selector::{parse_key_list, StorageSelector};

/// The store's contents: string keys to arbitrary JSON values
pub type StoreRecord = serde_json::Map<String, serde_json::Value>;
