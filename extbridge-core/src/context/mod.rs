/*
    context - Per-context extension runtime

    What extension code running in one context sees: `sendMessage` and
    `onMessage`, `storage.local`, `storage.onChanged`, plus navigation,
    clipboard and scan calls. Each runtime owns its own callback and
    listener registries and is the endpoint the host calls back into.
*/

pub mod error;
pub mod listeners;
pub mod registry;
pub mod responder;
pub mod storage;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

pub use error::{BridgeError, BridgeResult};
pub use listeners::{ListenerId, ListenerRegistry};
pub use registry::CallbackRegistry;
pub use responder::Responder;
pub use storage::StorageArea;

use crate::bridge::{Action, ContextEndpoint, ContextId, Envelope, Transport};
use crate::config::BridgeConfig;
use crate::notify::ChangeSet;

/// Sender descriptor handed to message listeners
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSender {
    pub id: String,
}

/// What a message listener did with a message
pub enum ListenerOutcome {
    /// Not handled, offer the message to the next listener
    Continue,
    /// Respond now with this value
    Respond(Value),
    /// Kept a clone of the responder and will respond later
    Pending,
    /// Respond with the future's output (`null` for `None`)
    Deferred(BoxFuture<'static, Option<Value>>),
}

pub type MessageListener = dyn Fn(&Value, &MessageSender, &Responder) -> ListenerOutcome + Send + Sync;

pub type StorageChangeListener = dyn Fn(&ChangeSet, &str) + Send + Sync;

impl ListenerRegistry<MessageListener> {
    pub fn add<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Value, &MessageSender, &Responder) -> ListenerOutcome + Send + Sync + 'static,
    {
        self.insert(Arc::new(listener))
    }
}

impl ListenerRegistry<StorageChangeListener> {
    pub fn add<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ChangeSet, &str) + Send + Sync + 'static,
    {
        self.insert(Arc::new(listener))
    }
}

pub struct ContextRuntime {
    id: ContextId,
    config: BridgeConfig,
    transport: Arc<dyn Transport>,
    callbacks: CallbackRegistry,
    message_listeners: ListenerRegistry<MessageListener>,
    change_listeners: ListenerRegistry<StorageChangeListener>,
}

impl ContextRuntime {
    pub fn new<T>(id: ContextId, transport: T, config: &BridgeConfig) -> Arc<Self>
    where
        T: Transport + 'static,
    {
        Arc::new(Self {
            id,
            config: config.clone(),
            transport: Arc::new(transport),
            callbacks: CallbackRegistry::new(),
            message_listeners: ListenerRegistry::new(),
            change_listeners: ListenerRegistry::new(),
        })
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Calls still waiting for the host
    pub fn pending_calls(&self) -> usize {
        self.callbacks.pending()
    }

    /// Send `message` to the peer context and wait for its response
    pub async fn send_message<M: Serialize + ?Sized>(&self, message: &M) -> BridgeResult<Value> {
        let data = serde_json::to_string(message)?;
        self.call(Action::SendMessage, Some(data)).await
    }

    pub fn on_message(&self) -> &ListenerRegistry<MessageListener> {
        &self.message_listeners
    }

    pub fn storage(&self) -> StorageArea<'_> {
        StorageArea::new(self)
    }

    pub fn on_storage_changed(&self) -> &ListenerRegistry<StorageChangeListener> {
        &self.change_listeners
    }

    pub fn navigate_to(&self, url: &str) -> BridgeResult<()> {
        self.command(Action::NavigateTo, Value::String(url.to_string()).to_string())
    }

    pub fn open_options_page(&self) -> BridgeResult<()> {
        self.navigate_to(&self.config.options_page)
    }

    /// Sub-pages have nothing to close; go back to the home page
    pub fn close_page(&self) -> BridgeResult<()> {
        self.navigate_to(&self.config.home_page)
    }

    pub fn copy_to_clipboard(&self, text: &str) -> BridgeResult<()> {
        // Clipboard text travels verbatim so quotes inside it survive.
        self.command(Action::CopyToClipboard, text.to_string())
    }

    /// Ask the host to scan a QR code and wait for the decoded text
    pub async fn scan_qr(&self) -> BridgeResult<String> {
        match self.call(Action::ScanQr, None).await? {
            Value::String(text) => Ok(text),
            other => Ok(other.to_string()),
        }
    }

    pub(crate) async fn call(&self, action: Action, data: Option<String>) -> BridgeResult<Value> {
        let (callback_id, settled) = self.callbacks.register();
        let envelope = Envelope::new(action, callback_id.clone(), data);

        if let Err(e) = self.transport.post(envelope.to_body()) {
            self.callbacks.cancel(&callback_id);
            return Err(e.into());
        }

        settled.await.map_err(|_| BridgeError::ContextClosed)?
    }

    fn command(&self, action: Action, data: String) -> BridgeResult<()> {
        self.transport.post(Envelope::command(action, Some(data)).to_body())?;
        Ok(())
    }

    fn dispatch_message(&self, callback_id: &str, json: &str) {
        let message = serde_json::from_str::<Value>(json).unwrap_or_else(|e| {
            debug!(error = %e, "Unreadable message payload, delivering {{}}");
            Value::Object(Default::default())
        });
        let sender = MessageSender {
            id: self.config.runtime_id.clone(),
        };
        let responder = Responder::new(callback_id, self.transport.clone());

        for listener in self.message_listeners.snapshot() {
            let outcome = catch_unwind(AssertUnwindSafe(|| listener(&message, &sender, &responder)));

            match outcome {
                Ok(ListenerOutcome::Continue) => continue,
                Ok(ListenerOutcome::Respond(value)) => {
                    responder.send(value);
                }
                Ok(ListenerOutcome::Pending) => {}
                Ok(ListenerOutcome::Deferred(response)) => {
                    spawn_deferred(response, responder.clone());
                }
                Err(_) => {
                    error!(context = %self.id, "Message listener panicked");
                    continue;
                }
            }
            return;
        }

        debug!(context = %self.id, callback_id = %callback_id, "No listener handled the message");
    }
}

fn spawn_deferred(response: BoxFuture<'static, Option<Value>>, responder: Responder) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                let value = response.await.unwrap_or(Value::Null);
                responder.send(value);
            });
        }
        Err(_) => warn!(
            callback_id = %responder.callback_id(),
            "No async runtime for a deferred response, dropping it"
        ),
    }
}

impl ContextEndpoint for ContextRuntime {
    fn resolve_callback(&self, callback_id: &str, json: &str) {
        self.callbacks.resolve(callback_id, json);
    }

    fn reject_callback(&self, callback_id: &str, message: &str) {
        self.callbacks.reject(callback_id, message);
    }

    fn deliver_message(&self, callback_id: &str, json: &str) {
        self.dispatch_message(callback_id, json);
    }

    fn storage_changed(&self, changes_json: &str, area: &str) {
        let changes = ChangeSet::parse(changes_json);
        for listener in self.change_listeners.snapshot() {
            if catch_unwind(AssertUnwindSafe(|| listener(&changes, area))).is_err() {
                error!(context = %self.id, "Storage change listener panicked");
            }
        }
    }
}
