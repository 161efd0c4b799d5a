//! Profile projection rules
//!
//! A profile is any JSON object inside the `profiles` array. Only three
//! fields matter here: `id`, `pubKey` and the secret `privKey`.

use serde_json::Value;
use uuid::Uuid;

use crate::store::StoreRecord;

/// Store key whose writes trigger replication
pub const PROFILES_KEY: &str = "profiles";

pub const ID_FIELD: &str = "id";
pub const PUBLIC_KEY_FIELD: &str = "pubKey";
pub const SECRET_FIELD: &str = "privKey";
pub const SYNCED_AT_FIELD: &str = "lastSyncedAt";

/// Length of a plaintext hex secret (32 bytes)
pub const SECRET_HEX_LEN: usize = 64;

/// Identity used to correlate a profile across the three stores:
/// `id`, else `pubKey`, else a fresh UUID.
pub fn stable_identity(profile: &StoreRecord) -> String {
    [ID_FIELD, PUBLIC_KEY_FIELD]
        .iter()
        .find_map(|field| profile.get(*field).and_then(Value::as_str))
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// True only for exactly 64 lowercase hex characters
pub fn is_plaintext_secret(secret: &str) -> bool {
    secret.len() == SECRET_HEX_LEN && secret.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// The profile's secret if it qualifies for the credential store
pub fn plaintext_secret(profile: &StoreRecord) -> Option<&str> {
    profile
        .get(SECRET_FIELD)
        .and_then(Value::as_str)
        .filter(|secret| is_plaintext_secret(secret))
}

/// Copy of `profile` without its secret, stamped with identity and sync time
pub fn sanitize(profile: &StoreRecord, identity: &str, synced_at: &str) -> StoreRecord {
    let mut shared = profile.clone();
    shared.remove(SECRET_FIELD);
    shared.insert(ID_FIELD.to_string(), Value::String(identity.to_string()));
    shared.insert(SYNCED_AT_FIELD.to_string(), Value::String(synced_at.to_string()));
    shared
}
