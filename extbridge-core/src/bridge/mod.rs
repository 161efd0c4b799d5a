//! Host side of the bridge: envelopes, routing and the dispatch queue

pub mod endpoint;
pub mod envelope;
pub mod host;
pub mod platform;
mod router;
pub mod scan;
pub mod transport;

pub use endpoint::{ContextEndpoint, ContextId};
pub use envelope::{Action, Envelope};
pub use host::{BridgeHost, BridgeHostBuilder, HostError, CREDENTIALS_DIR};
pub use platform::{NoopPlatform, PlatformHandler};
pub use scan::{ScanOutcome, ScanReply, Scanner, SCAN_CANCELLED, SCAN_UNAVAILABLE};
pub use transport::{HostTransport, Transport, TransportError};
