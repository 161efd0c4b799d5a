//! Pending-call correlation for one context
//!
//! Every call that expects an answer registers here and gets a fresh id.
//! The host later settles the id exactly once; later settlements and
//! unknown ids are ignored.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use super::error::BridgeError;

type Settlement = Result<Value, BridgeError>;

#[derive(Default)]
pub struct CallbackRegistry {
    last_id: AtomicU64,
    pending: Mutex<HashMap<String, oneshot::Sender<Settlement>>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id (`"1"`, `"2"`, ...) and its continuation
    pub fn register(&self) -> (String, oneshot::Receiver<Settlement>) {
        let id = (self.last_id.fetch_add(1, Ordering::Relaxed) + 1).to_string();
        let (tx, rx) = oneshot::channel();
        self.lock().insert(id.clone(), tx);
        (id, rx)
    }

    /// Settle `id` with the parsed `json`; text that is not JSON is delivered
    /// as a string value. Returns whether a pending call was settled.
    pub fn resolve(&self, id: &str, json: &str) -> bool {
        let value = serde_json::from_str(json).unwrap_or_else(|_| Value::String(json.to_string()));
        self.settle(id, Ok(value))
    }

    pub fn reject(&self, id: &str, message: &str) -> bool {
        self.settle(id, Err(BridgeError::Rejected(message.to_string())))
    }

    /// Forget `id` without settling it
    pub fn cancel(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn settle(&self, id: &str, settlement: Settlement) -> bool {
        let Some(tx) = self.lock().remove(id) else {
            debug!(callback_id = %id, "No pending call for id");
            return false;
        };
        // The caller may have stopped waiting.
        let _ = tx.send(settlement);
        true
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, oneshot::Sender<Settlement>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
