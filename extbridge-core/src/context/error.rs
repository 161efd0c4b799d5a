use thiserror::Error;

/// Failure of a bridge call as seen by a context
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The host (or the peer) rejected the call
    #[error("{0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// The context was torn down before the call settled
    #[error("Context closed before the call settled")]
    ContextClosed,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

impl From<crate::bridge::TransportError> for BridgeError {
    fn from(err: crate::bridge::TransportError) -> Self {
        BridgeError::Transport(err.to_string())
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
