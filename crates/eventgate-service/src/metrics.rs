//! Metrics collection and observability for the service.
//!
//! [`ServiceMetrics`] plays two roles: it is the concrete
//! `eventgate_core::monitoring::MetricsCollector` the Workflow Runner and
//! Fan-out Engine record against (spec §4.9), and it owns the
//! [`MetricsStore`] that backs `GET /metrics`'s counter snapshot (§6).
//! Alongside the domain counters it also registers Prometheus gauges and
//! histograms for HTTP-layer observability.

use crate::stores::metrics_store::{MetricValue, MetricsStore};
use eventgate_core::monitoring::MetricsCollector;
use eventgate_core::Timestamp;
use prometheus::{Histogram, IntCounterVec};
use std::sync::Arc;
use std::time::Duration;

/// Keys in the flat metrics namespace enumerated by spec §3.
pub mod keys {
    pub const EVENTS_TOTAL: &str = "events.total";
    pub const EVENTS_PENDING: &str = "events.pending";
    pub const EVENTS_DELIVERED: &str = "events.delivered";
    pub const EVENTS_FAILED: &str = "events.failed";
    pub const WEBHOOK_DELIVERED: &str = "webhook.delivered";
    pub const WEBHOOK_FAILED: &str = "webhook.failed";
    pub const QUEUE_DEPTH: &str = "queue.depth";
    pub const DLQ_COUNT: &str = "dlq.count";
    pub const LAST_PROCESSED_AT: &str = "last_processed_at";
}

/// Service metrics: the domain [`MetricsStore`] plus ambient Prometheus
/// instrumentation for HTTP-layer and retry observability.
pub struct ServiceMetrics {
    pub store: Arc<MetricsStore>,

    http_requests_total: IntCounterVec,
    http_request_duration: Histogram,
    workflow_step_duration: Histogram,
    retry_attempts_total: IntCounterVec,
    error_rate_by_category: IntCounterVec,
    rate_limit_exceeded_total: IntCounterVec,
}

impl ServiceMetrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        use prometheus::{register_histogram, register_int_counter_vec};

        Ok(Arc::new(Self {
            store: Arc::new(MetricsStore::new()),
            http_requests_total: register_int_counter_vec!(
                "eventgate_http_requests_total",
                "Total HTTP requests by route and status class",
                &["route", "status_class"]
            )?,
            http_request_duration: register_histogram!(
                "eventgate_http_request_duration_seconds",
                "HTTP request processing time",
                vec![0.001, 0.01, 0.1, 1.0, 5.0]
            )?,
            workflow_step_duration: register_histogram!(
                "eventgate_workflow_step_duration_seconds",
                "Workflow step processing time by step",
                vec![0.0001, 0.001, 0.01, 0.1, 1.0]
            )?,
            retry_attempts_total: register_int_counter_vec!(
                "eventgate_retry_attempts_total",
                "Retry attempts against an external dependency",
                &["component"]
            )?,
            error_rate_by_category: register_int_counter_vec!(
                "eventgate_errors_total",
                "Errors grouped by §7 category and transience",
                &["category", "transient"]
            )?,
            rate_limit_exceeded_total: register_int_counter_vec!(
                "eventgate_rate_limit_exceeded_total",
                "Rate limit rejections by endpoint",
                &["endpoint"]
            )?,
        }))
    }

    pub fn record_http_request(&self, route: &str, status_class: &str, duration: Duration) {
        self.http_requests_total
            .with_label_values(&[route, status_class])
            .inc();
        self.http_request_duration.observe(duration.as_secs_f64());
    }
}

impl MetricsCollector for ServiceMetrics {
    fn record_event_accepted(&self) {
        self.store.inc(keys::EVENTS_TOTAL, 1, None);
    }

    fn record_event_status_transition(&self, from: &str, to: &str) {
        match from {
            "pending" => self.store.dec(keys::EVENTS_PENDING),
            _ => {}
        }
        match to {
            "pending" => self.store.inc(keys::EVENTS_PENDING, 1, None),
            "delivered" => self.store.inc(keys::EVENTS_DELIVERED, 1, None),
            "failed" => self.store.inc(keys::EVENTS_FAILED, 1, None),
            _ => {}
        }
    }

    fn record_workflow_step_duration(&self, step: &str, duration: Duration) {
        self.workflow_step_duration.observe(duration.as_secs_f64());
        if step == "update-metrics" {
            self.store.set(
                keys::LAST_PROCESSED_AT,
                MetricValue::Timestamp(Timestamp::now()),
                None,
            );
        }
    }

    fn record_webhook_delivery(&self, success: bool) {
        if success {
            self.store.inc(keys::WEBHOOK_DELIVERED, 1, None);
        } else {
            self.store.inc(keys::WEBHOOK_FAILED, 1, None);
        }
    }

    fn record_queue_depth(&self, depth: i64) {
        self.store
            .set(keys::QUEUE_DEPTH, MetricValue::Integer(depth.max(0)), None);
    }

    fn record_dlq_write(&self) {
        self.store.inc(keys::DLQ_COUNT, 1, None);
    }

    fn record_rate_limit_exceeded(&self, endpoint: &str) {
        self.rate_limit_exceeded_total
            .with_label_values(&[endpoint])
            .inc();
    }

    fn record_error(&self, category: &str, is_transient: bool) {
        let transient_label = if is_transient { "true" } else { "false" };
        self.error_rate_by_category
            .with_label_values(&[category, transient_label])
            .inc();
    }

    fn record_retry_attempt(&self, component: &str) {
        self.retry_attempts_total
            .with_label_values(&[component])
            .inc();
    }
}

impl Default for ServiceMetrics {
    /// Test-only constructor: Prometheus panics on duplicate metric
    /// registration, so tests that construct more than one `ServiceMetrics`
    /// in the same process need unique metric names.
    fn default() -> Self {
        use prometheus::{register_histogram, register_int_counter_vec};

        let suffix = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();

        Self {
            store: Arc::new(MetricsStore::new()),
            http_requests_total: register_int_counter_vec!(
                format!("eventgate_http_requests_total_test_{suffix}"),
                "Test HTTP requests",
                &["route", "status_class"]
            )
            .unwrap(),
            http_request_duration: register_histogram!(
                format!("eventgate_http_request_duration_seconds_test_{suffix}"),
                "Test HTTP duration",
                vec![0.001, 1.0]
            )
            .unwrap(),
            workflow_step_duration: register_histogram!(
                format!("eventgate_workflow_step_duration_seconds_test_{suffix}"),
                "Test workflow step duration",
                vec![0.001, 1.0]
            )
            .unwrap(),
            retry_attempts_total: register_int_counter_vec!(
                format!("eventgate_retry_attempts_total_test_{suffix}"),
                "Test retry attempts",
                &["component"]
            )
            .unwrap(),
            error_rate_by_category: register_int_counter_vec!(
                format!("eventgate_errors_total_test_{suffix}"),
                "Test error rate",
                &["category", "transient"]
            )
            .unwrap(),
            rate_limit_exceeded_total: register_int_counter_vec!(
                format!("eventgate_rate_limit_exceeded_total_test_{suffix}"),
                "Test rate limit exceeded",
                &["endpoint"]
            )
            .unwrap(),
        }
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
