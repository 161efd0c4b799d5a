//! Credential store
//!
//! Holds plaintext profile secrets keyed by stable profile identity, visible
//! to companion apps that share the credential location. Entries are
//! enumerable so the synchronizer can prune removed profiles.

use thiserror::Error;
use zeroize::Zeroizing;

pub mod file;
pub mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("Credential not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Invalid passphrase")]
    InvalidPassphrase,

    #[error("Other error: {0}")]
    Other(String),
}

pub trait CredentialStore: Send + Sync {
    /// Insert or replace the secret for `profile_id`
    fn save_secret(&self, profile_id: &str, secret: &str) -> Result<(), CredentialStoreError>;

    fn load_secret(&self, profile_id: &str) -> Result<Zeroizing<String>, CredentialStoreError>;

    /// Delete the secret for `profile_id`; deleting an absent entry succeeds
    fn delete_secret(&self, profile_id: &str) -> Result<(), CredentialStoreError>;

    fn list_profile_ids(&self) -> Result<Vec<String>, CredentialStoreError>;
}
