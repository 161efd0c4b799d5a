//! JSON-lines bridge scripts
//!
//! Each non-empty line is one of:
//!
//! ```text
//! {"from": "ui", "action": "storageSet", "callbackId": "1", "data": {"theme": "dark"}}
//! {"scan": "ui", "result": "nostr:npub1..."}
//! {"scan": "ui", "error": "Camera permission denied"}
//! ```
//!
//! `data` that is not a string is JSON-encoded before posting; string data is
//! posted verbatim. Lines starting with `#` are comments.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use extbridge_core::bridge::{
    BridgeHostBuilder, ContextEndpoint, ContextId, PlatformHandler, ScanReply, Scanner, Transport,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptLine {
    Scan {
        scan: ContextId,
        #[serde(default)]
        result: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
    Post {
        from: ContextId,
        action: String,
        #[serde(default, rename = "callbackId")]
        callback_id: Option<String>,
        #[serde(default)]
        data: Option<Value>,
    },
}

impl ScriptLine {
    /// Parse one script line. Blank lines and comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(line)?))
    }

    /// Context that posts this line, for `Post` lines
    pub fn origin(&self) -> Option<ContextId> {
        match self {
            ScriptLine::Post { from, .. } => Some(*from),
            ScriptLine::Scan { .. } => None,
        }
    }

    /// Message body as the context would post it
    pub fn body(&self) -> Option<Value> {
        let ScriptLine::Post {
            action,
            callback_id,
            data,
            ..
        } = self
        else {
            return None;
        };

        let mut body = json!({
            "action": action,
            "callbackId": callback_id.clone().unwrap_or_default(),
        });
        if let Some(data) = data {
            body["data"] = match data {
                Value::String(text) => Value::String(text.clone()),
                other => Value::String(other.to_string()),
            };
        }
        Some(body)
    }
}

/// Payload text as a JSON value, or the raw text when it is not JSON
fn payload(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Endpoint that turns every host call into an output event
struct PrintingEndpoint {
    context: ContextId,
    events: mpsc::UnboundedSender<Value>,
}

impl PrintingEndpoint {
    fn emit(&self, event: Value) {
        let _ = self.events.send(event);
    }
}

impl ContextEndpoint for PrintingEndpoint {
    fn resolve_callback(&self, callback_id: &str, json: &str) {
        self.emit(json!({
            "context": self.context,
            "event": "resolve",
            "callbackId": callback_id,
            "value": payload(json),
        }));
    }

    fn reject_callback(&self, callback_id: &str, message: &str) {
        self.emit(json!({
            "context": self.context,
            "event": "reject",
            "callbackId": callback_id,
            "message": message,
        }));
    }

    fn deliver_message(&self, callback_id: &str, json: &str) {
        self.emit(json!({
            "context": self.context,
            "event": "message",
            "callbackId": callback_id,
            "message": payload(json),
        }));
    }

    fn storage_changed(&self, changes_json: &str, area: &str) {
        self.emit(json!({
            "context": self.context,
            "event": "storageChanged",
            "area": area,
            "changes": payload(changes_json),
        }));
    }
}

struct PrintingPlatform {
    events: mpsc::UnboundedSender<Value>,
}

impl PlatformHandler for PrintingPlatform {
    fn navigate_to(&self, context: ContextId, url: &str) {
        let _ = self.events.send(json!({"context": context, "event": "navigate", "url": url}));
    }

    fn copy_to_clipboard(&self, text: &str) {
        let _ = self.events.send(json!({"event": "clipboard", "text": text}));
    }
}

/// Scanner that waits for `scan` lines in the script
struct ScriptedScanner;

impl Scanner for ScriptedScanner {
    fn start(&self, reply: ScanReply) {
        debug!(context = %reply.context(), "Scan started, waiting for a scan line");
    }
}

/// Run `script` through a host built by `builder` and return every event
/// the contexts and the platform observed, in order.
pub async fn run(builder: BridgeHostBuilder, script: &str) -> Result<Vec<Value>> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    let background = Arc::new(PrintingEndpoint {
        context: ContextId::Background,
        events: events_tx.clone(),
    });
    let ui = Arc::new(PrintingEndpoint {
        context: ContextId::Ui,
        events: events_tx.clone(),
    });

    let background_transport = builder.transport(ContextId::Background);
    let ui_transport = builder.transport(ContextId::Ui);

    let (host, handle) = builder
        .platform(Arc::new(PrintingPlatform { events: events_tx }))
        .scanner(ContextId::Ui, Arc::new(ScriptedScanner))
        .attach(ContextId::Background, &background)
        .attach(ContextId::Ui, &ui)
        .spawn();

    for (number, line) in script.lines().enumerate() {
        let parsed = ScriptLine::parse(line).with_context(|| format!("line {}", number + 1))?;

        match parsed {
            None => continue,
            Some(ScriptLine::Scan { scan, result, error }) => match (result, error) {
                (Some(text), None) => host.deliver_scan_result(scan, text),
                (None, Some(message)) => host.deliver_scan_error(scan, message),
                _ => bail!("line {}: scan needs exactly one of result or error", number + 1),
            },
            Some(line) => {
                if let (Some(from), Some(body)) = (line.origin(), line.body()) {
                    let transport = match from {
                        ContextId::Background => &background_transport,
                        ContextId::Ui => &ui_transport,
                    };
                    transport.post(body)?;
                }
            }
        }
    }

    host.shutdown();
    handle.await.context("dispatch task failed")?;

    drop(background_transport);
    drop(ui_transport);
    drop(background);
    drop(ui);

    let mut events = Vec::new();
    while let Some(event) = events_rx.recv().await {
        events.push(event);
    }
    Ok(events)
}
