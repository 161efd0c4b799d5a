//! Metric names and descriptions
//!
//! Counters are recorded through the `metrics` facade at the call sites; an
//! application installs whatever recorder it wants. Without one they are
//! no-ops.

use metrics::{describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Describe every metric the bridge records
pub fn init_metrics() {
    // Routing
    describe_counter!("bridge.envelopes.routed", "Envelopes routed, labelled by action");
    describe_counter!("bridge.envelopes.unknown", "Envelopes with an unrecognised action");
    describe_histogram!("bridge.dispatch.duration_ms", "Time spent handling one host command");

    // Primary store
    describe_counter!("store.operations.read", "Store get operations");
    describe_counter!("store.operations.write", "Store set operations");
    describe_counter!("store.operations.delete", "Store remove operations");
    describe_counter!("store.operations.clear", "Store clear operations");

    // Replication
    describe_counter!("replication.credentials.upserted", "Credentials written to the credential store");
    describe_counter!("replication.credentials.pruned", "Stale credentials deleted");
    describe_counter!("replication.credentials.failed", "Credential writes or deletes that failed");
}

/// Records elapsed milliseconds into a histogram when stopped
pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    pub fn stop(self) {
        histogram!(self.name).record(self.start.elapsed().as_secs_f64() * 1000.0);
    }
}
