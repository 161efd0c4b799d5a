//! In-memory credential store for tests

use super::{CredentialStore, CredentialStoreError};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use zeroize::Zeroizing;

fn handle_poison<T>(_err: PoisonError<T>) -> CredentialStoreError {
    CredentialStoreError::Other("Lock poisoned: a thread panicked while holding the lock".to_string())
}

#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    secrets: Arc<RwLock<HashMap<String, Zeroizing<String>>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save_secret(&self, profile_id: &str, secret: &str) -> Result<(), CredentialStoreError> {
        self.secrets
            .write()
            .map_err(handle_poison)?
            .insert(profile_id.to_string(), Zeroizing::new(secret.to_string()));
        Ok(())
    }

    fn load_secret(&self, profile_id: &str) -> Result<Zeroizing<String>, CredentialStoreError> {
        self.secrets
            .read()
            .map_err(handle_poison)?
            .get(profile_id)
            .cloned()
            .ok_or_else(|| CredentialStoreError::NotFound(profile_id.to_string()))
    }

    fn delete_secret(&self, profile_id: &str) -> Result<(), CredentialStoreError> {
        self.secrets.write().map_err(handle_poison)?.remove(profile_id);
        Ok(())
    }

    fn list_profile_ids(&self) -> Result<Vec<String>, CredentialStoreError> {
        Ok(self.secrets.read().map_err(handle_poison)?.keys().cloned().collect())
    }
}
