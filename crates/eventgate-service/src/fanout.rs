//! Webhook Fan-out Engine (spec §4.4): subscription enumeration, payload
//! validation, HMAC signing, timed HTTP POST, bounded retry with
//! exponential backoff, per-subscription status transition, metrics
//! update, and DLQ write.
//!
//! Concurrency is bounded by a `tokio::sync::Semaphore`-gated `JoinSet`
//! rather than an external executor crate, preferring `tokio`'s own
//! primitives over `futures` combinators elsewhere in the workspace.

use eventgate_core::monitoring::MetricsCollector;
use eventgate_core::{CorrelationId, DlqEntry, Event, RetryPolicy, RetryState, SchemaValidator, Signer};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{instrument, warn};

use crate::stores::{DlqStore, SubscriptionStore};

/// Per-attempt HTTP timeout (spec §4.4, §5).
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of fanning one event out to every active subscription.
#[derive(Debug, Clone, Copy, Default)]
pub struct FanOutSummary {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// A cooperative cancellation signal the workflow propagates to in-flight
/// deliveries (spec §4.4 "Cancellation", §5).
pub type CancellationSignal = watch::Receiver<bool>;

/// Create a signal + its controlling sender for tests and callers that need
/// to trigger cancellation explicitly.
pub fn cancellation_pair() -> (watch::Sender<bool>, CancellationSignal) {
    watch::channel(false)
}

/// The Webhook Fan-out Engine.
pub struct FanOutEngine {
    subscriptions: Arc<SubscriptionStore>,
    dlq: Arc<DlqStore>,
    metrics: Arc<dyn MetricsCollector>,
    http: reqwest::Client,
    signing_secret: Option<String>,
    max_concurrency: usize,
    schema: SchemaValidator,
    user_agent: String,
}

impl FanOutEngine {
    pub fn new(
        subscriptions: Arc<SubscriptionStore>,
        dlq: Arc<DlqStore>,
        metrics: Arc<dyn MetricsCollector>,
        signing_secret: Option<String>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            subscriptions,
            dlq,
            metrics,
            http: reqwest::Client::new(),
            signing_secret,
            max_concurrency: max_concurrency.max(1),
            schema: SchemaValidator,
            user_agent: format!("EventGate/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Fan `event` out to every currently `active` subscription (spec §4.4
    /// algorithm steps 1-3). A snapshot of active subscriptions is taken
    /// up-front; deliveries that start after a subscription's status has
    /// changed still run against the snapshot value, matching the
    /// last-writer-wins policy in §5.
    #[instrument(skip(self, event, cancellation), fields(event_id = %event.event_id))]
    pub async fn fan_out(
        self: &Arc<Self>,
        event: &Event,
        correlation_id: CorrelationId,
        cancellation: CancellationSignal,
    ) -> FanOutSummary {
        let subscriptions = self.subscriptions.list_active();
        let attempted = subscriptions.len();
        let permits = Arc::new(Semaphore::new(self.max_concurrency.min(attempted.max(1))));

        let mut tasks = JoinSet::new();
        for subscription in subscriptions {
            let engine = Arc::clone(self);
            let permits = Arc::clone(&permits);
            let event = event.clone();
            let cancellation = cancellation.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.expect("semaphore not closed");
                engine.deliver(&subscription, &event, correlation_id, cancellation).await
            });
        }

        let mut delivered = 0;
        let mut failed = 0;
        while let Some(outcome) = tasks.join_next().await {
            match outcome {
                Ok(true) => delivered += 1,
                Ok(false) => failed += 1,
                Err(join_error) => {
                    warn!(error = %join_error, "fan-out delivery task panicked");
                    failed += 1;
                }
            }
        }

        FanOutSummary {
            attempted,
            delivered,
            failed,
        }
    }

    /// Deliver `event` to a single subscription, returning whether delivery
    /// ultimately succeeded (spec §4.4 "Deliver").
    async fn deliver(
        &self,
        subscription: &eventgate_core::Subscription,
        event: &Event,
        correlation_id: CorrelationId,
        mut cancellation: CancellationSignal,
    ) -> bool {
        let document = self.outbound_document(event, correlation_id);

        if let Err(schema_error) = self.schema.validate(&document) {
            self.subscriptions
                .record_validation_error(subscription.id, &schema_error.to_string());
            self.metrics.record_webhook_delivery(false);
            return false;
        }

        let body = serde_json::to_vec(&document).expect("validated document serializes");
        let policy = RetryPolicy::fan_out();
        let mut state = RetryState::new();
        let mut last_error = String::new();
        let mut last_status_code: Option<u16> = None;
        let mut extra_wait = Duration::ZERO;

        loop {
            if *cancellation.borrow() {
                return false;
            }

            let attempt_number = state.total_attempts;
            let request = self.build_request(subscription, event, correlation_id, &body, attempt_number);

            let outcome = tokio::select! {
                result = tokio::time::timeout(DELIVERY_TIMEOUT, request.send()) => result,
                _ = cancellation.changed() => {
                    return false;
                }
            };

            match outcome {
                Ok(Ok(response)) if response.status().is_success() => {
                    self.subscriptions.record_success(subscription.id);
                    self.metrics.record_webhook_delivery(true);
                    return true;
                }
                Ok(Ok(response)) => {
                    let status = response.status();
                    last_status_code = Some(status.as_u16());
                    last_error = format!("HTTP {status}");
                    extra_wait = retry_after_wait(&response);
                }
                Ok(Err(transport_error)) => {
                    last_error = transport_error.to_string();
                }
                Err(_timed_out) => {
                    last_error = format!("request timed out after {DELIVERY_TIMEOUT:?}");
                }
            }

            self.metrics.record_retry_attempt("webhook_fanout");

            if !state.can_retry(&policy) {
                break;
            }

            let delay = state.get_delay(&policy) + extra_wait;
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancellation.changed() => return false,
            }
            state.next_attempt();
        }

        self.subscriptions.record_failure(subscription.id, &last_error);
        let dlq_entry = DlqEntry::new(
            subscription.id,
            event.event_id.clone(),
            subscription.url.clone(),
            correlation_id,
            last_error,
            last_status_code,
        );
        self.dlq.put_delivery_failure(dlq_entry);
        self.metrics.record_webhook_delivery(false);
        self.metrics.record_dlq_write();
        false
    }

    fn outbound_document(&self, event: &Event, correlation_id: CorrelationId) -> serde_json::Value {
        let mut metadata = serde_json::to_value(&event.metadata).unwrap_or_else(|_| json!({}));
        if let Some(object) = metadata.as_object_mut() {
            object.insert("correlation_id".to_string(), json!(correlation_id.to_string()));
        }

        json!({
            "event_id": event.event_id.to_string(),
            "event_type": event.event_type,
            "timestamp": event.timestamp.to_rfc3339(),
            "payload": event.payload,
            "metadata": metadata,
            "created_at": event.created_at.to_rfc3339(),
        })
    }

    fn build_request(
        &self,
        subscription: &eventgate_core::Subscription,
        event: &Event,
        correlation_id: CorrelationId,
        body: &[u8],
        attempt: u32,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .post(&subscription.url)
            .header("Content-Type", "application/json")
            .header("User-Agent", self.user_agent.clone())
            .header("X-Event-ID", event.event_id.to_string())
            .header("X-Correlation-ID", correlation_id.to_string())
            .header("X-Attempt", attempt.to_string())
            .timeout(DELIVERY_TIMEOUT)
            .body(body.to_vec());

        if let Some(secret) = &self.signing_secret {
            request = request.header("X-Signature", Signer::header_value(body, secret));
        }

        request
    }
}

/// Parse a numeric `Retry-After` header into an additive wait (spec §4.4:
/// "honor a numeric `Retry-After` header as an additive wait atop backoff").
fn retry_after_wait(response: &reqwest::Response) -> Duration {
    if response.status().as_u16() != 429 {
        return Duration::ZERO;
    }
    response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
#[path = "fanout_tests.rs"]
mod tests;
