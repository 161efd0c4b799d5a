//! Bridge host
//!
//! Owns both routers and the single dispatch queue. Every inbound envelope,
//! scan outcome and shutdown request goes through one tokio task, so storage
//! operations never run concurrently.
//!
//! Setup is explicit: transports are handed out first, contexts are built on
//! them, then the contexts are attached as each other's peers.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::endpoint::{ContextEndpoint, ContextId};
use super::envelope::Envelope;
use super::platform::{NoopPlatform, PlatformHandler};
use super::router::{MessageRouter, RouterServices};
use super::scan::{ScanOutcome, Scanner};
use super::transport::HostTransport;
use crate::config::Config;
use crate::metrics::Timer;
use crate::notify::ChangeNotifier;
use crate::replication::{
    CredentialStoreError, FileCredentialStore, MetadataStore, ReplicationSynchronizer,
};
use crate::store::{FileSettings, LocalStore, StoreError};

/// Directory under the shared dir holding credential files
pub const CREDENTIALS_DIR: &str = "credentials";

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Credential store error: {0}")]
    Credentials(#[from] CredentialStoreError),
}

#[derive(Debug)]
pub(crate) enum HostCommand {
    Inbound { origin: ContextId, body: Value },
    ScanOutcome { context: ContextId, outcome: ScanOutcome },
    Shutdown,
}

pub struct BridgeHostBuilder {
    store: LocalStore,
    synchronizer: Option<ReplicationSynchronizer>,
    platform: Arc<dyn PlatformHandler>,
    scanners: HashMap<ContextId, Arc<dyn Scanner>>,
    endpoints: HashMap<ContextId, Weak<dyn ContextEndpoint>>,
    area_name: String,
    commands: mpsc::UnboundedSender<HostCommand>,
    inbox: mpsc::UnboundedReceiver<HostCommand>,
}

impl BridgeHostBuilder {
    pub fn new(store: LocalStore) -> Self {
        let (commands, inbox) = mpsc::unbounded_channel();
        Self {
            store,
            synchronizer: None,
            platform: Arc::new(NoopPlatform),
            scanners: HashMap::new(),
            endpoints: HashMap::new(),
            area_name: "local".to_string(),
            commands,
            inbox,
        }
    }

    /// File-backed host laid out as `config.store` describes.
    ///
    /// Replication is wired only when `config.replication.enabled` is set.
    pub fn from_config(config: &Config) -> Result<Self, HostError> {
        let settings = FileSettings::open(&config.store.data_dir)?;
        let store = LocalStore::with_storage_key(Arc::new(settings), config.store.storage_key.clone());

        let mut builder = Self::new(store).area_name(config.bridge.area_name.clone());

        if config.replication.enabled {
            let shared = FileSettings::open(&config.store.shared_dir)?;
            let metadata =
                MetadataStore::with_key(Arc::new(shared), config.store.shared_profiles_key.clone());
            let credentials = FileCredentialStore::new(
                config.store.shared_dir.join(CREDENTIALS_DIR),
                config.replication.credential_passphrase.as_deref(),
            )?;
            builder = builder.synchronizer(ReplicationSynchronizer::new(metadata, Arc::new(credentials)));
        }

        Ok(builder)
    }

    pub fn synchronizer(mut self, synchronizer: ReplicationSynchronizer) -> Self {
        self.synchronizer = Some(synchronizer);
        self
    }

    pub fn platform(mut self, platform: Arc<dyn PlatformHandler>) -> Self {
        self.platform = platform;
        self
    }

    /// Wire a scanner for `context`. Contexts without one get scan requests rejected.
    pub fn scanner(mut self, context: ContextId, scanner: Arc<dyn Scanner>) -> Self {
        self.scanners.insert(context, scanner);
        self
    }

    pub fn area_name(mut self, area_name: impl Into<String>) -> Self {
        self.area_name = area_name.into();
        self
    }

    /// Transport for the context that will be attached as `context`
    pub fn transport(&self, context: ContextId) -> HostTransport {
        HostTransport::new(context, self.commands.clone())
    }

    /// Register `endpoint` as `context`. Only a weak reference is kept.
    pub fn attach<E>(mut self, context: ContextId, endpoint: &Arc<E>) -> Self
    where
        E: ContextEndpoint + 'static,
    {
        let weak: Weak<dyn ContextEndpoint> = Arc::downgrade(endpoint) as Weak<dyn ContextEndpoint>;
        self.endpoints.insert(context, weak);
        self
    }

    /// Start the dispatch task. Must be called inside a tokio runtime.
    pub fn spawn(self) -> (BridgeHost, JoinHandle<()>) {
        let Self {
            store,
            synchronizer,
            platform,
            mut scanners,
            endpoints,
            area_name,
            commands,
            inbox,
        } = self;

        for context in ContextId::ALL {
            if !endpoints.contains_key(&context) {
                warn!(context = %context, "Context not attached, deliveries to it are dropped");
            }
        }

        let notifier = ChangeNotifier::new(area_name, endpoints.values().cloned().collect());
        let routers = Routers {
            background: MessageRouter::new(
                ContextId::Background,
                endpoints.get(&ContextId::Background).cloned(),
                endpoints.get(&ContextId::Ui).cloned(),
                scanners.remove(&ContextId::Background),
            ),
            ui: MessageRouter::new(
                ContextId::Ui,
                endpoints.get(&ContextId::Ui).cloned(),
                endpoints.get(&ContextId::Background).cloned(),
                scanners.remove(&ContextId::Ui),
            ),
        };
        let services = RouterServices {
            store,
            synchronizer,
            notifier,
            platform,
            commands: commands.downgrade(),
        };

        let handle = tokio::spawn(dispatch_loop(inbox, routers, services));
        info!("Bridge host started");

        (BridgeHost { commands }, handle)
    }
}

/// Handle to a running bridge host
#[derive(Clone)]
pub struct BridgeHost {
    commands: mpsc::UnboundedSender<HostCommand>,
}

impl BridgeHost {
    pub fn transport(&self, context: ContextId) -> HostTransport {
        HostTransport::new(context, self.commands.clone())
    }

    /// Resolve `context`'s pending scan with decoded text
    pub fn deliver_scan_result(&self, context: ContextId, text: impl Into<String>) {
        self.send(HostCommand::ScanOutcome {
            context,
            outcome: ScanOutcome::Decoded(text.into()),
        });
    }

    /// Reject `context`'s pending scan
    pub fn deliver_scan_error(&self, context: ContextId, message: impl Into<String>) {
        self.send(HostCommand::ScanOutcome {
            context,
            outcome: ScanOutcome::Failed(message.into()),
        });
    }

    /// Stop the dispatch loop after the commands already queued
    pub fn shutdown(&self) {
        self.send(HostCommand::Shutdown);
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    fn send(&self, command: HostCommand) {
        if self.commands.send(command).is_err() {
            debug!("Bridge host already stopped");
        }
    }
}

struct Routers {
    background: MessageRouter,
    ui: MessageRouter,
}

impl Routers {
    fn get_mut(&mut self, context: ContextId) -> &mut MessageRouter {
        match context {
            ContextId::Background => &mut self.background,
            ContextId::Ui => &mut self.ui,
        }
    }
}

async fn dispatch_loop(
    mut inbox: mpsc::UnboundedReceiver<HostCommand>,
    mut routers: Routers,
    services: RouterServices,
) {
    while let Some(command) = inbox.recv().await {
        let timer = Timer::new("bridge.dispatch.duration_ms");
        match command {
            HostCommand::Inbound { origin, body } => match Envelope::from_body(&body) {
                Some(envelope) => routers.get_mut(origin).route(envelope, &services),
                None => warn!(origin = %origin, "Dropping malformed envelope"),
            },
            HostCommand::ScanOutcome { context, outcome } => {
                routers.get_mut(context).settle_scan(outcome)
            }
            HostCommand::Shutdown => break,
        }
        timer.stop();
    }

    info!("Bridge host stopped");
}
