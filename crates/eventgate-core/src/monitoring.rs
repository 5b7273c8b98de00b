//! Metrics collection boundary (spec §4.9).
//!
//! This module defines *what* to collect; the infrastructure layer
//! (`eventgate-service::metrics`) implements it with Prometheus. Keeping the
//! trait here preserves the clean-architecture boundary: domain code depends
//! on the trait, never on a concrete metrics backend.
//!
//! # Best-Effort Pattern
//!
//! Per §4.9 and §7, metric operations are secondary: failures are logged and
//! swallowed, never propagated to a user-visible operation. Implementations
//! must not panic or return errors from these methods.

use std::time::Duration;

/// Metrics collector for the Event/Subscription/Fan-out domain.
///
/// All methods take `&self` to support `Arc<dyn MetricsCollector>` sharing
/// across async tasks; implementations must be thread-safe and infallible.
pub trait MetricsCollector: Send + Sync {
    /// An event was accepted at ingress: `events.total++`.
    fn record_event_accepted(&self);

    /// The workflow transitioned an event to `pending`, `delivered`, or
    /// `failed`; updates the corresponding `events.*` gauge.
    fn record_event_status_transition(&self, from: &str, to: &str);

    /// Workflow step processing duration, for `last_processed_at` and rate
    /// calculations.
    fn record_workflow_step_duration(&self, step: &str, duration: Duration);

    /// A webhook delivery attempt's outcome: `webhook.delivered++` or
    /// `webhook.failed++`.
    fn record_webhook_delivery(&self, success: bool);

    /// Current durable queue depth.
    fn record_queue_depth(&self, depth: i64);

    /// A dead-letter entry was written; `dlq.count` tracks the live total.
    fn record_dlq_write(&self);

    /// A rate limit was enforced against a client.
    fn record_rate_limit_exceeded(&self, endpoint: &str);

    /// An error occurred, tagged by its §7 category, for alerting.
    fn record_error(&self, category: &str, is_transient: bool);

    /// A retry attempt against an external dependency (store, subscriber).
    fn record_retry_attempt(&self, component: &str);
}

/// No-op metrics collector for tests and any code path that does not need
/// to assert on metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetricsCollector;

impl MetricsCollector for NoOpMetricsCollector {
    fn record_event_accepted(&self) {}
    fn record_event_status_transition(&self, _from: &str, _to: &str) {}
    fn record_workflow_step_duration(&self, _step: &str, _duration: Duration) {}
    fn record_webhook_delivery(&self, _success: bool) {}
    fn record_queue_depth(&self, _depth: i64) {}
    fn record_dlq_write(&self) {}
    fn record_rate_limit_exceeded(&self, _endpoint: &str) {}
    fn record_error(&self, _category: &str, _is_transient: bool) {}
    fn record_retry_attempt(&self, _component: &str) {}
}

#[cfg(test)]
#[path = "monitoring_tests.rs"]
mod tests;
