//! Settings backends
//!
//! A settings backend is the platform's flat string-keyed settings store.
//! The primary store and the shared metadata replica each keep exactly one
//! serialized JSON document under a well-known key.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::errors::{StoreError, StoreResult};

const SETTINGS_FILE: &str = "settings.json";

fn handle_poison<T>(_err: PoisonError<T>) -> StoreError {
    StoreError::Backend("Lock poisoned: a thread panicked while holding the lock".to_string())
}

/// Flat string settings store
pub trait SettingsBackend: Send + Sync {
    fn read(&self, key: &str) -> StoreResult<Option<String>>;

    fn write(&self, key: &str, value: &str) -> StoreResult<()>;

    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// In-memory settings (non-persistent, for tests and ephemeral hosts)
#[derive(Clone, Default)]
pub struct MemorySettings {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsBackend for MemorySettings {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().map_err(handle_poison)?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .write()
            .map_err(handle_poison)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.write().map_err(handle_poison)?.remove(key);
        Ok(())
    }
}

/// File-backed settings: every key lives in one JSON object on disk,
/// rewritten atomically on each change.
pub struct FileSettings {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSettings {
    /// Open (or create) the settings document inside `dir`
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        fs::create_dir_all(dir.as_ref())?;

        Ok(Self {
            path: dir.as_ref().join(SETTINGS_FILE),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_all(&self) -> StoreResult<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save_all(&self, entries: &HashMap<String, String>) -> StoreResult<()> {
        let data = serde_json::to_vec_pretty(entries)?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, data)?;
        fs::rename(temp_path, &self.path)?;
        Ok(())
    }
}

impl SettingsBackend for FileSettings {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        let _guard = self.lock.lock().map_err(handle_poison)?;
        Ok(self.load_all()?.remove(key))
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        let _guard = self.lock.lock().map_err(handle_poison)?;
        let mut entries = self.load_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.save_all(&entries)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let _guard = self.lock.lock().map_err(handle_poison)?;
        let mut entries = self.load_all()?;
        if entries.remove(key).is_some() {
            self.save_all(&entries)?;
        }
        Ok(())
    }
}
