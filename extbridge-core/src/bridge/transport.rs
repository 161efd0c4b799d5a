//! Context → host transport
//!
//! The only primitive a context has is "post an opaque message object to the
//! host". Posts from one transport are delivered in order.

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use super::endpoint::ContextId;
use super::host::HostCommand;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("bridge host is not running")]
    Closed,
}

pub trait Transport: Send + Sync {
    /// Post a message body to the host without waiting for it to be handled
    fn post(&self, body: Value) -> Result<(), TransportError>;
}

/// Transport feeding a [`BridgeHost`](super::BridgeHost) dispatch queue
#[derive(Clone)]
pub struct HostTransport {
    origin: ContextId,
    commands: mpsc::UnboundedSender<HostCommand>,
}

impl HostTransport {
    pub(crate) fn new(origin: ContextId, commands: mpsc::UnboundedSender<HostCommand>) -> Self {
        Self { origin, commands }
    }

    pub fn origin(&self) -> ContextId {
        self.origin
    }
}

impl Transport for HostTransport {
    fn post(&self, body: Value) -> Result<(), TransportError> {
        self.commands
            .send(HostCommand::Inbound {
                origin: self.origin,
                body,
            })
            .map_err(|_| TransportError::Closed)
    }
}
