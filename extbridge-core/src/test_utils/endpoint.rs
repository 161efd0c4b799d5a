//! Endpoint that records every host call

use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::bridge::ContextEndpoint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointCall {
    Resolve { callback_id: String, json: String },
    Reject { callback_id: String, message: String },
    DeliverMessage { callback_id: String, json: String },
    StorageChanged { changes: String, area: String },
}

#[derive(Default)]
pub struct RecordingEndpoint {
    calls: Mutex<Vec<EndpointCall>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<EndpointCall>>>,
}

impl RecordingEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EndpointCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn take_calls(&self) -> Vec<EndpointCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    /// Stream of calls made after this point
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<EndpointCall> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    fn record(&self, call: EndpointCall) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(call.clone()).is_ok());
        self.calls.lock().unwrap().push(call);
    }
}

impl ContextEndpoint for RecordingEndpoint {
    fn resolve_callback(&self, callback_id: &str, json: &str) {
        self.record(EndpointCall::Resolve {
            callback_id: callback_id.into(),
            json: json.into(),
        });
    }

    fn reject_callback(&self, callback_id: &str, message: &str) {
        self.record(EndpointCall::Reject {
            callback_id: callback_id.into(),
            message: message.into(),
        });
    }

    fn deliver_message(&self, callback_id: &str, json: &str) {
        self.record(EndpointCall::DeliverMessage {
            callback_id: callback_id.into(),
            json: json.into(),
        });
    }

    fn storage_changed(&self, changes: &str, area: &str) {
        self.record(EndpointCall::StorageChanged {
            changes: changes.into(),
            area: area.into(),
        });
    }
}
