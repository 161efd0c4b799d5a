//! Profile replication
//!
//! Projects the `profiles` collection of the primary store into a shared
//! metadata replica and a credential store.

pub mod credentials;
pub mod metadata;
pub mod profile;
pub mod synchronizer;

pub use credentials::{
    CredentialStore, CredentialStoreError, FileCredentialStore, MemoryCredentialStore,
};
pub use metadata::{MetadataStore, DEFAULT_SHARED_PROFILES_KEY};
pub use synchronizer::{ReplicationSynchronizer, SyncReport};
