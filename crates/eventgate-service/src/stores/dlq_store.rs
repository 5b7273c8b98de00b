//! Dead-Letter Log (spec §3, §4.10): two distinct namespaces — per-delivery
//! entries keyed by `(subscription_id, event_id)`, written by the Fan-out
//! Engine, and workflow-terminal event failures keyed by `event_id`, written
//! by the Workflow Runner. Both are TTL-bounded; expired entries are
//! excluded from reads but not eagerly evicted (next write that touches the
//! same key will naturally overwrite a stale entry; a background sweep is
//! not required for correctness per §4.10, only for bounded memory growth).

use eventgate_core::{DlqEntry, EventDlqEntry, EventId, SubscriptionId};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

#[derive(Debug)]
pub struct DlqStore {
    deliveries: RwLock<HashMap<(SubscriptionId, EventId), DlqEntry>>,
    event_failures: RwLock<HashMap<EventId, EventDlqEntry>>,
    retention: Duration,
}

impl Default for DlqStore {
    fn default() -> Self {
        Self::new(eventgate_core::dlq::DEFAULT_RETENTION)
    }
}

impl DlqStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            deliveries: RwLock::new(HashMap::new()),
            event_failures: RwLock::new(HashMap::new()),
            retention,
        }
    }

    /// Record a terminal per-subscription delivery failure (§4.4 budget
    /// exhaustion path).
    pub fn put_delivery_failure(&self, entry: DlqEntry) {
        let key = (entry.subscription_id, entry.event_id.clone());
        self.deliveries
            .write()
            .expect("dlq store lock poisoned")
            .insert(key, entry);
    }

    /// Record a workflow-terminal event failure (§4.3 terminal failure path).
    pub fn put_event_failure(&self, entry: EventDlqEntry) {
        let key = entry.event_id.clone();
        self.event_failures
            .write()
            .expect("dlq store lock poisoned")
            .insert(key, entry);
    }

    pub fn list_delivery_failures(&self, limit: usize) -> Vec<DlqEntry> {
        let rows = self.deliveries.read().expect("dlq store lock poisoned");
        let mut entries: Vec<DlqEntry> = rows
            .values()
            .filter(|e| e.within_retention(self.retention))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.failed_at.as_datetime().cmp(a.failed_at.as_datetime()));
        entries.truncate(limit);
        entries
    }

    pub fn list_event_failures(&self, limit: usize) -> Vec<EventDlqEntry> {
        let rows = self.event_failures.read().expect("dlq store lock poisoned");
        let mut entries: Vec<EventDlqEntry> = rows
            .values()
            .filter(|e| e.within_retention(self.retention))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.failed_at.as_datetime().cmp(a.failed_at.as_datetime()));
        entries.truncate(limit);
        entries
    }

    /// Combined live entry count within retention, backing the `dlq.count`
    /// metrics KPI (§4.10, §3).
    pub fn count(&self) -> u64 {
        let deliveries = self.deliveries.read().expect("dlq store lock poisoned");
        let event_failures = self.event_failures.read().expect("dlq store lock poisoned");
        let live_deliveries = deliveries
            .values()
            .filter(|e| e.within_retention(self.retention))
            .count();
        let live_event_failures = event_failures
            .values()
            .filter(|e| e.within_retention(self.retention))
            .count();
        (live_deliveries + live_event_failures) as u64
    }
}

#[cfg(test)]
#[path = "dlq_store_tests.rs"]
mod tests;
