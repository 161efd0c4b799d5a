//! Context identities and the host → context call surface

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two script contexts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextId {
    Background,
    Ui,
}

impl ContextId {
    pub const ALL: [ContextId; 2] = [ContextId::Background, ContextId::Ui];

    /// The other context
    pub fn peer(self) -> Self {
        match self {
            ContextId::Background => ContextId::Ui,
            ContextId::Ui => ContextId::Background,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContextId::Background => "background",
            ContextId::Ui => "ui",
        }
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry points the host invokes on a context.
///
/// Payloads are JSON text exactly as carried by the envelope. Calls are made
/// from the host dispatch task and must not block.
pub trait ContextEndpoint: Send + Sync {
    /// Settle a pending call successfully
    fn resolve_callback(&self, callback_id: &str, json: &str);

    /// Settle a pending call with an error message
    fn reject_callback(&self, callback_id: &str, message: &str);

    /// Hand a relayed message to the context's message listeners
    fn deliver_message(&self, callback_id: &str, json: &str);

    /// Notify storage change listeners
    fn storage_changed(&self, changes_json: &str, area: &str);
}
