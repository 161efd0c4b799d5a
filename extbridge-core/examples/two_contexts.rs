//! Two contexts sharing one runtime over an in-memory host
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run --example two_contexts
//! ```

use std::sync::Arc;

use extbridge_core::bridge::{BridgeHostBuilder, ContextId};
use extbridge_core::config::BridgeConfig;
use extbridge_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use extbridge_core::store::{LocalStore, MemorySettings, StorageSelector};
use extbridge_core::{ContextRuntime, ListenerOutcome};
use serde_json::json;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging_with_config(LogConfig::new(LogLevel::Debug).with_target(true))?;

    let config = BridgeConfig::default();
    let builder = BridgeHostBuilder::new(LocalStore::new(Arc::new(MemorySettings::new())));
    let background = ContextRuntime::new(ContextId::Background, builder.transport(ContextId::Background), &config);
    let ui = ContextRuntime::new(ContextId::Ui, builder.transport(ContextId::Ui), &config);
    let (host, handle) = builder
        .attach(ContextId::Background, &background)
        .attach(ContextId::Ui, &ui)
        .spawn();

    background.on_message().add(|message, sender, _| {
        info!(from = %sender.id, ?message, "Background received message");
        ListenerOutcome::Respond(json!({"pubKey": "npub1example"}))
    });
    ui.on_storage_changed().add(|changes, area| {
        info!(area, keys = changes.len(), "UI saw storage change");
    });

    let reply = ui.send_message(&json!({"kind": "getPublicKey"})).await?;
    info!(%reply, "UI got reply");

    let mut items = serde_json::Map::new();
    items.insert("theme".to_string(), json!("dark"));
    background.storage().set(items).await?;

    let stored = ui.storage().get(StorageSelector::All).await?;
    info!(?stored, "UI read the store");

    host.shutdown();
    handle.await?;
    Ok(())
}
