//! Wire envelope exchanged between a context and the host
//!
//! ```text
//! { "action": "<tag>", "callbackId": "<id>", "data": "<json text>" }
//! ```
//! `data` is always JSON-encoded text, never a nested object.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    SendMessage,
    SendResponse,
    StorageGet,
    StorageSet,
    StorageRemove,
    StorageClear,
    NavigateTo,
    CopyToClipboard,
    ScanQr,
    /// Any tag this host does not understand
    Unknown(String),
}

impl Action {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "sendMessage" => Action::SendMessage,
            "sendResponse" => Action::SendResponse,
            "storageGet" => Action::StorageGet,
            "storageSet" => Action::StorageSet,
            "storageRemove" => Action::StorageRemove,
            "storageClear" => Action::StorageClear,
            "navigateTo" => Action::NavigateTo,
            "copyToClipboard" => Action::CopyToClipboard,
            "scanQR" => Action::ScanQr,
            other => Action::Unknown(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            Action::SendMessage => "sendMessage",
            Action::SendResponse => "sendResponse",
            Action::StorageGet => "storageGet",
            Action::StorageSet => "storageSet",
            Action::StorageRemove => "storageRemove",
            Action::StorageClear => "storageClear",
            Action::NavigateTo => "navigateTo",
            Action::CopyToClipboard => "copyToClipboard",
            Action::ScanQr => "scanQR",
            Action::Unknown(tag) => tag,
        }
    }

    /// Bounded label for metrics; unknown tags collapse into one value
    pub fn metric_label(&self) -> &'static str {
        match self {
            Action::SendMessage => "send_message",
            Action::SendResponse => "send_response",
            Action::StorageGet => "storage_get",
            Action::StorageSet => "storage_set",
            Action::StorageRemove => "storage_remove",
            Action::StorageClear => "storage_clear",
            Action::NavigateTo => "navigate_to",
            Action::CopyToClipboard => "copy_to_clipboard",
            Action::ScanQr => "scan_qr",
            Action::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_tag())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Action::from_tag(&tag))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub action: Action,

    #[serde(default)]
    pub callback_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Envelope {
    pub fn new(action: Action, callback_id: impl Into<String>, data: Option<String>) -> Self {
        Self {
            action,
            callback_id: callback_id.into(),
            data,
        }
    }

    /// Fire-and-forget envelope with no callback id
    pub fn command(action: Action, data: Option<String>) -> Self {
        Self::new(action, String::new(), data)
    }

    /// Lenient decoding of an inbound message body.
    ///
    /// Returns `None` unless the body is an object with a string `action`.
    /// A missing or non-string `callbackId` becomes `""`; a non-string
    /// `data` is treated as absent.
    pub fn from_body(body: &Value) -> Option<Self> {
        let object = body.as_object()?;
        let action = object.get("action")?.as_str()?;

        Some(Self {
            action: Action::from_tag(action),
            callback_id: object
                .get("callbackId")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            data: object.get("data").and_then(Value::as_str).map(str::to_owned),
        })
    }

    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("action".to_string(), Value::String(self.action.as_tag().to_string()));
        body.insert("callbackId".to_string(), Value::String(self.callback_id.clone()));
        if let Some(data) = &self.data {
            body.insert("data".to_string(), Value::String(data.clone()));
        }
        Value::Object(body)
    }

    /// `data`, or `default` when absent
    pub fn data_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.data.as_deref().unwrap_or(default)
    }
}
