//! Storage change broadcasting
//!
//! Every store write produces a keyed diff that is delivered, identically, to
//! both contexts regardless of which one wrote.

use std::collections::BTreeMap;
use std::sync::Weak;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::bridge::ContextEndpoint;
use crate::store::StoreRecord;

/// Change to a single key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// Keyed diff: `{ key: { newValue } }` or `{ key: { oldValue } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeMap<String, StorageChange>);

impl ChangeSet {
    /// Diff for a `set`: only the written keys, with their new values
    pub fn from_written(items: &StoreRecord) -> Self {
        Self(
            items
                .iter()
                .map(|(key, value)| {
                    let change = StorageChange {
                        old_value: None,
                        new_value: Some(value.clone()),
                    };
                    (key.clone(), change)
                })
                .collect(),
        )
    }

    /// Diff for a `remove` or `clear`: the entries that were actually deleted
    pub fn from_removed(removed: &StoreRecord) -> Self {
        Self(
            removed
                .iter()
                .map(|(key, value)| {
                    let change = StorageChange {
                        old_value: Some(value.clone()),
                        new_value: None,
                    };
                    (key.clone(), change)
                })
                .collect(),
        )
    }

    /// Decode a delivered diff. Anything unreadable is an empty diff.
    pub fn parse(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            debug!(error = %e, "Unreadable change set");
            Self::default()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&StorageChange> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StorageChange)> {
        self.0.iter()
    }
}

/// Delivers change sets to every attached context
pub struct ChangeNotifier {
    area: String,
    endpoints: Vec<Weak<dyn ContextEndpoint>>,
}

impl ChangeNotifier {
    pub fn new(area: impl Into<String>, endpoints: Vec<Weak<dyn ContextEndpoint>>) -> Self {
        Self {
            area: area.into(),
            endpoints,
        }
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    /// Serialize `changes` once and hand the same payload to each endpoint.
    ///
    /// Returns the number of endpoints reached. An empty diff is still sent.
    pub fn broadcast(&self, changes: &ChangeSet) -> usize {
        let payload = match serde_json::to_string(changes) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to encode change set");
                return 0;
            }
        };

        let mut delivered = 0;
        for endpoint in &self.endpoints {
            match endpoint.upgrade() {
                Some(endpoint) => {
                    endpoint.storage_changed(&payload, &self.area);
                    delivered += 1;
                }
                None => debug!("Skipping change notification for a dropped context"),
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{record, EndpointCall, RecordingEndpoint};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_written_diff_shape() {
        let changes = ChangeSet::from_written(&record(json!({"a": 1, "b": {"x": true}})));
        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            json!({"a": {"newValue": 1}, "b": {"newValue": {"x": true}}})
        );
    }

    #[test]
    fn test_removed_diff_shape() {
        let changes = ChangeSet::from_removed(&record(json!({"gone": "v"})));
        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            json!({"gone": {"oldValue": "v"}})
        );
    }

    #[test]
    fn test_parse_invalid_is_empty() {
        assert!(ChangeSet::parse("not json").is_empty());
        assert!(ChangeSet::parse("[1,2]").is_empty());

        let parsed = ChangeSet::parse(r#"{"k": {"newValue": 5}}"#);
        assert_eq!(parsed.get("k").unwrap().new_value, Some(json!(5)));
    }

    #[test]
    fn test_broadcast_reaches_every_endpoint_once() {
        let background = Arc::new(RecordingEndpoint::new());
        let ui = Arc::new(RecordingEndpoint::new());
        let endpoints: Vec<Weak<dyn ContextEndpoint>> = vec![
            Arc::downgrade(&background) as Weak<dyn ContextEndpoint>,
            Arc::downgrade(&ui) as Weak<dyn ContextEndpoint>,
        ];
        let notifier = ChangeNotifier::new("local", endpoints);

        let delivered = notifier.broadcast(&ChangeSet::from_written(&record(json!({"k": 1}))));
        assert_eq!(delivered, 2);

        for endpoint in [&background, &ui] {
            let calls = endpoint.calls();
            assert_eq!(calls.len(), 1);
            match &calls[0] {
                EndpointCall::StorageChanged { changes, area } => {
                    assert_eq!(area, "local");
                    assert_eq!(
                        serde_json::from_str::<Value>(changes).unwrap(),
                        json!({"k": {"newValue": 1}})
                    );
                }
                other => panic!("unexpected call {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty_diff_is_delivered() {
        let ui = Arc::new(RecordingEndpoint::new());
        let notifier = ChangeNotifier::new("local", vec![Arc::downgrade(&ui) as Weak<dyn ContextEndpoint>]);

        assert_eq!(notifier.broadcast(&ChangeSet::default()), 1);
        assert_eq!(
            ui.calls(),
            vec![EndpointCall::StorageChanged { changes: "{}".into(), area: "local".into() }]
        );
    }

    #[test]
    fn test_dropped_endpoint_skipped() {
        let ui = Arc::new(RecordingEndpoint::new());
        let gone = Arc::new(RecordingEndpoint::new());
        let weak_gone = Arc::downgrade(&gone) as Weak<dyn ContextEndpoint>;
        drop(gone);

        let notifier = ChangeNotifier::new("local", vec![weak_gone, Arc::downgrade(&ui) as Weak<dyn ContextEndpoint>]);
        assert_eq!(notifier.broadcast(&ChangeSet::from_removed(&record(json!({"a": 1})))), 1);
    }
}
