/*
    synchronizer.rs - Profile replication

    Fans a `profiles` write out to two replicas:
      - the metadata store gets every profile with its secret stripped
      - the credential store gets plaintext hex secrets keyed by identity,
        and loses entries whose profile disappeared

    There is no transaction across the three stores. Each step is
    best-effort and the next profiles write re-derives both replicas.
*/

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use metrics::counter;
use serde_json::Value;
use tracing::{debug, warn};

use super::credentials::CredentialStore;
use super::metadata::MetadataStore;
use super::profile::{plaintext_secret, sanitize, stable_identity, PROFILES_KEY};
use crate::store::StoreRecord;

/// Outcome of one replication pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Sanitized profiles written to the metadata replica
    pub profiles: usize,
    pub credentials_upserted: usize,
    pub credentials_pruned: usize,
    /// Human-readable description of every step that failed
    pub failures: Vec<String>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ReplicationSynchronizer {
    metadata: MetadataStore,
    credentials: Arc<dyn CredentialStore>,
}

impl ReplicationSynchronizer {
    pub fn new(metadata: MetadataStore, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            metadata,
            credentials,
        }
    }

    /// Replicate the `profiles` entry of a `set` payload.
    ///
    /// Returns `None` when `items` carries no `profiles` array.
    pub fn sync_items(&self, items: &StoreRecord) -> Option<SyncReport> {
        match items.get(PROFILES_KEY) {
            Some(Value::Array(profiles)) => Some(self.sync_profiles(profiles)),
            _ => None,
        }
    }

    pub fn sync_profiles(&self, profiles: &[Value]) -> SyncReport {
        let mut report = SyncReport::default();
        let synced_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut current_ids = HashSet::new();
        let mut shared = Vec::with_capacity(profiles.len());

        for profile in profiles.iter().filter_map(Value::as_object) {
            let identity = stable_identity(profile);

            if let Some(secret) = plaintext_secret(profile) {
                match self.credentials.save_secret(&identity, secret) {
                    Ok(()) => {
                        report.credentials_upserted += 1;
                        counter!("replication.credentials.upserted").increment(1);
                    }
                    Err(e) => {
                        warn!(profile = %identity, error = %e, "Failed to store profile credential");
                        counter!("replication.credentials.failed").increment(1);
                        report.failures.push(format!("save {}: {}", identity, e));
                    }
                }
            }

            shared.push(Value::Object(sanitize(profile, &identity, &synced_at)));
            current_ids.insert(identity);
        }

        report.profiles = shared.len();
        if let Err(e) = self.metadata.save_profiles(&shared) {
            warn!(error = %e, "Failed to write shared profile metadata");
            report.failures.push(format!("metadata: {}", e));
        }

        self.prune(&current_ids, &mut report);

        debug!(
            profiles = report.profiles,
            upserted = report.credentials_upserted,
            pruned = report.credentials_pruned,
            failures = report.failures.len(),
            "Replicated profiles"
        );
        report
    }

    fn prune(&self, current_ids: &HashSet<String>, report: &mut SyncReport) {
        let existing = match self.credentials.list_profile_ids() {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Failed to enumerate stored credentials");
                report.failures.push(format!("list: {}", e));
                return;
            }
        };

        for id in existing.into_iter().filter(|id| !current_ids.contains(id)) {
            match self.credentials.delete_secret(&id) {
                Ok(()) => {
                    report.credentials_pruned += 1;
                    counter!("replication.credentials.pruned").increment(1);
                }
                Err(e) => {
                    warn!(profile = %id, error = %e, "Failed to prune stale credential");
                    counter!("replication.credentials.failed").increment(1);
                    report.failures.push(format!("delete {}: {}", id, e));
                }
            }
        }
    }
}
