/*
    router.rs - Host-side message router

    One router per context. It inspects the action of every envelope the
    context posts and does exactly one of:
      - relay the payload to the peer context (sendMessage / sendResponse)
      - run a storage operation and settle the caller's own callback
      - spawn a platform command (navigate / clipboard)
      - hand the request to the context's scanner

    The router never fails: malformed data degrades to empty defaults, and
    deliveries to a dropped context are skipped.
*/

use std::sync::{Arc, Weak};

use metrics::counter;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::endpoint::{ContextEndpoint, ContextId};
use super::envelope::{Action, Envelope};
use super::host::HostCommand;
use super::platform::PlatformHandler;
use super::scan::{ScanOutcome, ScanReply, Scanner, SCAN_CANCELLED, SCAN_UNAVAILABLE};
use crate::notify::{ChangeNotifier, ChangeSet};
use crate::replication::ReplicationSynchronizer;
use crate::store::{parse_key_list, LocalStore, StorageSelector, StoreRecord};

/// State shared by both routers, owned by the dispatch task
pub(crate) struct RouterServices {
    pub store: LocalStore,
    pub synchronizer: Option<ReplicationSynchronizer>,
    pub notifier: ChangeNotifier,
    pub platform: Arc<dyn PlatformHandler>,
    pub commands: mpsc::WeakUnboundedSender<HostCommand>,
}

pub(crate) struct MessageRouter {
    context: ContextId,
    own: Option<Weak<dyn ContextEndpoint>>,
    peer: Option<Weak<dyn ContextEndpoint>>,
    scanner: Option<Arc<dyn Scanner>>,
    pending_scan: Option<String>,
}

impl MessageRouter {
    pub fn new(
        context: ContextId,
        own: Option<Weak<dyn ContextEndpoint>>,
        peer: Option<Weak<dyn ContextEndpoint>>,
        scanner: Option<Arc<dyn Scanner>>,
    ) -> Self {
        Self {
            context,
            own,
            peer,
            scanner,
            pending_scan: None,
        }
    }

    /// Callback id of the scan awaiting an outcome, if any
    #[cfg(test)]
    pub fn pending_scan(&self) -> Option<&str> {
        self.pending_scan.as_deref()
    }

    pub fn route(&mut self, envelope: Envelope, services: &RouterServices) {
        counter!("bridge.envelopes.routed", "action" => envelope.action.metric_label()).increment(1);
        debug!(
            context = %self.context,
            action = %envelope.action,
            callback_id = %envelope.callback_id,
            "Routing envelope"
        );

        match &envelope.action {
            Action::SendMessage => {
                if let Some(peer) = self.endpoint(&self.peer) {
                    peer.deliver_message(&envelope.callback_id, envelope.data_or("{}"));
                }
            }
            Action::SendResponse => {
                if let Some(peer) = self.endpoint(&self.peer) {
                    peer.resolve_callback(&envelope.callback_id, envelope.data_or("null"));
                }
            }
            Action::StorageGet => self.storage_get(&envelope, services),
            Action::StorageSet => self.storage_set(&envelope, services),
            Action::StorageRemove => self.storage_remove(&envelope, services),
            Action::StorageClear => self.storage_clear(&envelope, services),
            Action::NavigateTo => {
                if let Some(url) = envelope.data.as_deref().map(decode_text) {
                    let platform = services.platform.clone();
                    let context = self.context;
                    tokio::spawn(async move { platform.navigate_to(context, &url) });
                }
            }
            Action::CopyToClipboard => {
                if let Some(text) = envelope.data.clone() {
                    let platform = services.platform.clone();
                    tokio::spawn(async move { platform.copy_to_clipboard(&text) });
                }
            }
            Action::ScanQr => self.scan(&envelope.callback_id, services),
            Action::Unknown(tag) => {
                counter!("bridge.envelopes.unknown").increment(1);
                warn!(context = %self.context, action = %tag, "Ignoring unknown action");
            }
        }
    }

    /// Settle the pending scan with `outcome`. Ignored when nothing is pending.
    pub fn settle_scan(&mut self, outcome: ScanOutcome) {
        let Some(callback_id) = self.pending_scan.take() else {
            debug!(context = %self.context, "Scan outcome with no pending scan, ignoring");
            return;
        };

        match outcome {
            ScanOutcome::Decoded(text) => {
                self.resolve_own(&callback_id, &Value::String(text).to_string())
            }
            ScanOutcome::Failed(message) => self.reject_own(&callback_id, &message),
        }
    }

    fn storage_get(&self, envelope: &Envelope, services: &RouterServices) {
        let selector = StorageSelector::parse(envelope.data_or("null"));
        match services.store.get(&selector) {
            Ok(selected) => {
                self.resolve_own(&envelope.callback_id, &Value::Object(selected).to_string())
            }
            Err(e) => self.reject_own(&envelope.callback_id, &e.to_string()),
        }
    }

    fn storage_set(&self, envelope: &Envelope, services: &RouterServices) {
        let items = match serde_json::from_str::<Value>(envelope.data_or("{}")) {
            Ok(Value::Object(items)) => items,
            _ => {
                debug!(context = %self.context, "storageSet without an object, nothing written");
                self.resolve_own(&envelope.callback_id, "{}");
                return;
            }
        };

        if let Err(e) = services.store.set(&items) {
            warn!(context = %self.context, error = %e, "Failed to persist store");
            self.reject_own(&envelope.callback_id, &e.to_string());
            return;
        }

        if let Some(report) = services
            .synchronizer
            .as_ref()
            .and_then(|sync| sync.sync_items(&items))
        {
            if !report.is_clean() {
                warn!(failures = ?report.failures, "Profile replication incomplete");
            }
        }

        services.notifier.broadcast(&ChangeSet::from_written(&items));
        self.resolve_own(&envelope.callback_id, "{}");
    }

    fn storage_remove(&self, envelope: &Envelope, services: &RouterServices) {
        let keys = parse_key_list(envelope.data_or("[]"));
        self.finish_removal(envelope, services, services.store.remove(&keys));
    }

    fn storage_clear(&self, envelope: &Envelope, services: &RouterServices) {
        self.finish_removal(envelope, services, services.store.clear());
    }

    fn finish_removal(
        &self,
        envelope: &Envelope,
        services: &RouterServices,
        removed: crate::store::StoreResult<StoreRecord>,
    ) {
        match removed {
            Ok(removed) => {
                if !removed.is_empty() {
                    services.notifier.broadcast(&ChangeSet::from_removed(&removed));
                }
                self.resolve_own(&envelope.callback_id, "{}");
            }
            Err(e) => {
                warn!(context = %self.context, error = %e, "Failed to persist store");
                self.reject_own(&envelope.callback_id, &e.to_string());
            }
        }
    }

    fn scan(&mut self, callback_id: &str, services: &RouterServices) {
        let Some(scanner) = self.scanner.clone() else {
            self.reject_own(callback_id, SCAN_UNAVAILABLE);
            return;
        };

        if self.pending_scan.is_some() {
            debug!(context = %self.context, callback_id = %callback_id, "Scan already pending, dropping request");
            return;
        }

        let Some(commands) = services.commands.upgrade() else {
            debug!(context = %self.context, "Host shutting down, scan not started");
            self.reject_own(callback_id, SCAN_CANCELLED);
            return;
        };

        self.pending_scan = Some(callback_id.to_string());
        scanner.start(ScanReply::new(self.context, commands));
    }

    fn endpoint(&self, slot: &Option<Weak<dyn ContextEndpoint>>) -> Option<Arc<dyn ContextEndpoint>> {
        let endpoint = slot.as_ref().and_then(Weak::upgrade);
        if endpoint.is_none() {
            debug!(context = %self.context, "Target context is not attached, skipping delivery");
        }
        endpoint
    }

    fn resolve_own(&self, callback_id: &str, json: &str) {
        if let Some(own) = self.endpoint(&self.own) {
            own.resolve_callback(callback_id, json);
        }
    }

    fn reject_own(&self, callback_id: &str, message: &str) {
        if let Some(own) = self.endpoint(&self.own) {
            own.reject_callback(callback_id, message);
        }
    }
}

/// Navigation target: a JSON string is decoded, anything else is taken as is
fn decode_text(data: &str) -> String {
    serde_json::from_str::<String>(data).unwrap_or_else(|_| data.to_string())
}
