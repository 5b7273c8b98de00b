//! Dead-letter entry types (spec §3, §4.10).
//!
//! Two distinct namespaces exist, matching §4.10: per-delivery entries keyed
//! by `(subscription_id, event_id)`, and workflow-terminal event failures
//! keyed by `event_id` alone. Both carry a bounded retention window; the
//! concrete store (`eventgate-service::stores::dlq_store`) enforces the TTL.

use crate::{CorrelationId, EventId, SubscriptionId, Timestamp};
use serde::{Deserialize, Serialize};

/// Default retention window for dead-letter entries (§3, §4.10): 7 days.
pub const DEFAULT_RETENTION: std::time::Duration = std::time::Duration::from_secs(7 * 24 * 60 * 60);

/// A failed delivery to a single subscription for a single event (§3: `DLQEntry`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqEntry {
    pub subscription_id: SubscriptionId,
    pub event_id: EventId,
    pub webhook_url: String,
    pub correlation_id: CorrelationId,
    pub last_error: String,
    pub last_status_code: Option<u16>,
    pub failed_at: Timestamp,
}

impl DlqEntry {
    pub fn new(
        subscription_id: SubscriptionId,
        event_id: EventId,
        webhook_url: String,
        correlation_id: CorrelationId,
        last_error: String,
        last_status_code: Option<u16>,
    ) -> Self {
        Self {
            subscription_id,
            event_id,
            webhook_url,
            correlation_id,
            last_error,
            last_status_code,
            failed_at: Timestamp::now(),
        }
    }

    /// Whether this entry is still within the retention window.
    pub fn within_retention(&self, retention: std::time::Duration) -> bool {
        self.failed_at.within_ttl(retention)
    }
}

/// Why a workflow-terminal event failure occurred (§4.3 terminal failure path).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventDlqReason {
    /// The `validate` step rejected the event (non-retryable per §4.3 step 1).
    ValidationFailed { message: String },
    /// A retryable store error exhausted the workflow's own retry budget.
    StoreRetriesExhausted { message: String },
    /// An otherwise-uncategorized internal invariant violation.
    Internal { message: String },
}

/// A workflow-terminal event failure, keyed by `event_id` (§4.10: "a
/// distinct DLQ namespace for workflow-terminal event failures").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDlqEntry {
    pub event_id: EventId,
    pub reason: EventDlqReason,
    pub correlation_id: CorrelationId,
    pub failed_at: Timestamp,
}

impl EventDlqEntry {
    pub fn new(event_id: EventId, reason: EventDlqReason, correlation_id: CorrelationId) -> Self {
        Self {
            event_id,
            reason,
            correlation_id,
            failed_at: Timestamp::now(),
        }
    }

    pub fn within_retention(&self, retention: std::time::Duration) -> bool {
        self.failed_at.within_ttl(retention)
    }
}

#[cfg(test)]
#[path = "dlq_tests.rs"]
mod tests;
