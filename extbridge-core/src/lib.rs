//! extbridge-core
//!
//! Joins two isolated script contexts (background and UI) into one
//! extension runtime: a message bus, a persistent key-value store with
//! change notifications, and replication of stored profiles into a shared
//! metadata replica and a credential store.

pub mod bridge;
pub mod config;
pub mod context;
pub mod logging;
pub mod metrics;
pub mod notify;
pub mod replication;
pub mod store;

#[cfg(test)]
pub(crate) mod test_utils;

pub use bridge::{BridgeHost, BridgeHostBuilder, ContextEndpoint, ContextId};
pub use config::Config;
pub use context::{BridgeError, ContextRuntime, ListenerOutcome};
pub use logging::{init_logging, LogLevel};
pub use store::{LocalStore, StorageSelector, StoreRecord};
