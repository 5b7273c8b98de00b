//! Shared fixtures for `eventgate-service` integration tests.
//!
//! Builds a real [`AppState`] wired to in-memory stores and an in-memory
//! Durable Queue, rather than mocking the router.

use eventgate_queue::{QueueClient, QueueClientFactory, QueueName};
use eventgate_service::{AppState, DlqStore, EventStore, HealthChecker, HealthStatus, RateLimiter, ServiceConfig, ServiceMetrics, SubscriptionStore};
use std::collections::HashMap;
use std::sync::Arc;

/// A [`HealthChecker`] that is always healthy, for tests that don't care
/// about health-check behavior.
pub struct AlwaysHealthy;

#[async_trait::async_trait]
impl HealthChecker for AlwaysHealthy {
    async fn check_basic_health(&self) -> HealthStatus {
        HealthStatus {
            is_healthy: true,
            checks: HashMap::new(),
        }
    }

    async fn check_deep_health(&self) -> HealthStatus {
        HealthStatus {
            is_healthy: true,
            checks: HashMap::new(),
        }
    }

    async fn check_readiness(&self) -> bool {
        true
    }
}

/// Build an [`AppState`] for tests, with a default [`ServiceConfig`] that
/// callers can mutate before passing it in.
pub fn test_app_state(config: ServiceConfig) -> AppState {
    let events = Arc::new(EventStore::new());
    let subscriptions = Arc::new(SubscriptionStore::new());
    let dlq = Arc::new(DlqStore::default());
    // `ServiceMetrics::default()` mints uniquely-suffixed Prometheus metric
    // names so multiple tests in one binary don't collide on the global
    // registry the way `ServiceMetrics::new()`'s literal names would.
    let metrics = Arc::new(ServiceMetrics::default());
    let queue_client: Arc<dyn QueueClient> = QueueClientFactory::create_test_client().into();
    let queue_name = QueueName::new("eventgate-events-test".to_string()).expect("literal queue name is valid");

    AppState {
        config,
        events,
        subscriptions,
        dlq,
        metrics,
        queue_client,
        queue_name,
        health_checker: Arc::new(AlwaysHealthy),
        subscribe_limiter: Arc::new(RateLimiter::subscribe_per_hour(100)),
        sample_limiter: Arc::new(RateLimiter::sample_per_hour(60)),
    }
}

/// A [`ServiceConfig`] with a fixed bearer token and an allow-listed
/// hostname, matching the subscriber URLs used across these tests.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.security.bearer_tokens = vec!["test-token".to_string()];
    config.security.allowed_hostnames = vec!["hooks.example.com".to_string()];
    config.rate_limits.subscribe_per_hour = 100;
    config.rate_limits.sample_per_hour = 60;
    config
}

pub fn bearer_header(token: &str) -> String {
    format!("Bearer {token}")
}

/// Run the Workflow Runner + Fan-out Engine against `state`'s Durable
/// Queue for `duration`, then signal shutdown and wait for the worker to
/// stop. Mirrors the background task `start_server` spawns, but scoped to
/// one test so it can assert on the store state afterward.
pub async fn drain_queue_for(state: &AppState, duration: std::time::Duration) {
    use eventgate_core::monitoring::MetricsCollector;
    use eventgate_service::{fanout, FanOutEngine, QueueDeliveryWorker, WorkflowRunner};

    let metrics = state.metrics.clone() as Arc<dyn MetricsCollector>;
    let engine = Arc::new(FanOutEngine::new(
        Arc::clone(&state.subscriptions),
        Arc::clone(&state.dlq),
        metrics.clone(),
        state.config.security.signing_secret.clone(),
        16,
    ));
    let runner = Arc::new(WorkflowRunner::new(
        Arc::clone(&state.events),
        Arc::clone(&state.dlq),
        metrics,
        engine,
    ));
    let worker = QueueDeliveryWorker::new(Arc::clone(&state.queue_client), state.queue_name.clone(), runner);
    let (shutdown_tx, shutdown_rx) = fanout::cancellation_pair();

    let handle = tokio::spawn(async move {
        worker.run(shutdown_rx).await;
    });
    tokio::time::sleep(duration).await;
    let _ = shutdown_tx.send(true);
    let _ = handle.await;
}
