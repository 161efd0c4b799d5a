//! QR scan channel
//!
//! A scan is a one-shot exchange: the router hands a [`ScanReply`] to the
//! context's [`Scanner`], which later delivers exactly one decoded string or
//! one failure. Delivery goes back through the host dispatch queue.

use tokio::sync::mpsc;
use tracing::debug;

use super::endpoint::ContextId;
use super::host::HostCommand;

/// Rejection sent when a context has no scanner
pub const SCAN_UNAVAILABLE: &str = "QR scanning not available";

/// Conventional failure message for a scan the user dismissed
pub const SCAN_CANCELLED: &str = "Scan cancelled";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Decoded(String),
    Failed(String),
}

/// One-shot reply handle for a scan request
#[derive(Debug)]
pub struct ScanReply {
    context: ContextId,
    commands: mpsc::UnboundedSender<HostCommand>,
}

impl ScanReply {
    pub(crate) fn new(context: ContextId, commands: mpsc::UnboundedSender<HostCommand>) -> Self {
        Self { context, commands }
    }

    /// Context that asked for the scan
    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn deliver_result(self, text: impl Into<String>) {
        self.deliver(ScanOutcome::Decoded(text.into()));
    }

    pub fn deliver_error(self, message: impl Into<String>) {
        self.deliver(ScanOutcome::Failed(message.into()));
    }

    pub fn cancel(self) {
        self.deliver_error(SCAN_CANCELLED);
    }

    fn deliver(self, outcome: ScanOutcome) {
        let command = HostCommand::ScanOutcome {
            context: self.context,
            outcome,
        };
        if self.commands.send(command).is_err() {
            debug!(context = %self.context, "Scan outcome dropped, host stopped");
        }
    }
}

/// Camera/decoder collaborator for one context.
///
/// `start` is called on the host dispatch task and must return promptly;
/// the actual capture runs elsewhere and answers through `reply`.
pub trait Scanner: Send + Sync {
    fn start(&self, reply: ScanReply);
}
