use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::bridge::{Action, Envelope, Transport};

/// Once-only reply handle for a delivered message.
///
/// Clones share the same state: whichever clone sends first wins.
#[derive(Clone)]
pub struct Responder {
    callback_id: String,
    transport: Arc<dyn Transport>,
    responded: Arc<AtomicBool>,
}

impl Responder {
    pub(crate) fn new(callback_id: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            callback_id: callback_id.into(),
            transport,
            responded: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn callback_id(&self) -> &str {
        &self.callback_id
    }

    pub fn has_responded(&self) -> bool {
        self.responded.load(Ordering::Acquire)
    }

    /// Post `sendResponse` with `value`. Returns false if a response was already sent.
    pub fn send(&self, value: Value) -> bool {
        if self.responded.swap(true, Ordering::AcqRel) {
            debug!(callback_id = %self.callback_id, "Response already sent, ignoring");
            return false;
        }

        let envelope = Envelope::new(Action::SendResponse, self.callback_id.clone(), Some(value.to_string()));
        if let Err(e) = self.transport.post(envelope.to_body()) {
            warn!(callback_id = %self.callback_id, error = %e, "Failed to post response");
        }
        true
    }
}
