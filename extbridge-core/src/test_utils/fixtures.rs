use serde_json::{json, Value};

use crate::store::StoreRecord;

/// Unwrap a `json!` object literal into a record
pub fn record(value: Value) -> StoreRecord {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// 64 lowercase hex characters built from one repeated byte
pub fn plaintext_secret(byte: u8) -> String {
    hex::encode([byte; 32])
}

pub fn profile(id: &str, secret: Option<&str>) -> Value {
    let mut profile = json!({"id": id, "name": format!("profile {id}")});
    if let Some(secret) = secret {
        profile["privKey"] = Value::String(secret.to_string());
    }
    profile
}
