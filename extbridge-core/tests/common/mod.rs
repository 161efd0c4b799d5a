#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use extbridge_core::bridge::{BridgeHost, BridgeHostBuilder, ContextId, PlatformHandler};
use extbridge_core::config::BridgeConfig;
use extbridge_core::notify::ChangeSet;
use extbridge_core::store::{LocalStore, MemorySettings};
use extbridge_core::ContextRuntime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const WAIT: Duration = Duration::from_secs(2);

/// Host plus both contexts, wired as each other's peers
pub struct Bridge {
    pub host: BridgeHost,
    pub handle: JoinHandle<()>,
    pub background: Arc<ContextRuntime>,
    pub ui: Arc<ContextRuntime>,
}

impl Bridge {
    pub fn context(&self, id: ContextId) -> &Arc<ContextRuntime> {
        match id {
            ContextId::Background => &self.background,
            ContextId::Ui => &self.ui,
        }
    }

    pub async fn stop(self) {
        self.host.shutdown();
        self.handle.await.expect("dispatch task panicked");
    }
}

pub fn memory_builder() -> BridgeHostBuilder {
    BridgeHostBuilder::new(LocalStore::new(Arc::new(MemorySettings::new())))
}

pub fn start(builder: BridgeHostBuilder) -> Bridge {
    let config = BridgeConfig::default();
    let background = ContextRuntime::new(
        ContextId::Background,
        builder.transport(ContextId::Background),
        &config,
    );
    let ui = ContextRuntime::new(ContextId::Ui, builder.transport(ContextId::Ui), &config);

    let (host, handle) = builder
        .attach(ContextId::Background, &background)
        .attach(ContextId::Ui, &ui)
        .spawn();

    Bridge {
        host,
        handle,
        background,
        ui,
    }
}

/// Forward every storage change a context sees into a channel
pub fn watch_changes(context: &ContextRuntime) -> mpsc::UnboundedReceiver<(ChangeSet, String)> {
    let (tx, rx) = mpsc::unbounded_channel();
    context.on_storage_changed().add(move |changes, area| {
        let _ = tx.send((changes.clone(), area.to_string()));
    });
    rx
}

pub async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out")
        .expect("channel closed")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    Navigate(ContextId, String),
    Copy(String),
}

/// Platform handler that reports every command on a channel
pub struct RecordingPlatform {
    tx: mpsc::UnboundedSender<PlatformCall>,
}

impl RecordingPlatform {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PlatformCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl PlatformHandler for RecordingPlatform {
    fn navigate_to(&self, context: ContextId, url: &str) {
        let _ = self.tx.send(PlatformCall::Navigate(context, url.to_string()));
    }

    fn copy_to_clipboard(&self, text: &str) {
        let _ = self.tx.send(PlatformCall::Copy(text.to_string()));
    }
}
