//! Shared harness for black-box end-to-end tests against a real, in-process
//! EventGate HTTP server bound to an ephemeral port.
//!
//! Spins up the same pieces `eventgate_service::start_server` wires
//! together, but keeps the bound `TcpListener` locally so the test can learn
//! the actual port before the server starts serving, rather than mocking
//! transport.

use eventgate_core::monitoring::MetricsCollector;
use eventgate_queue::{QueueClient, QueueClientFactory, QueueConfig, QueueName};
use eventgate_service::{
    create_router, fanout, AppState, DlqStore, EventStore, FanOutEngine, HealthChecker,
    HealthStatus, QueueDeliveryWorker, RateLimiter, ServiceConfig, ServiceMetrics,
    SubscriptionStore, WorkflowRunner,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

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

/// A running test server: its base URL and a handle that shuts it down
/// (HTTP listener + queue delivery worker) when dropped.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    shutdown: Option<tokio::sync::watch::Sender<bool>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
    worker_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(test_config()).await
    }

    pub async fn start_with(config: ServiceConfig) -> Self {
        let events = Arc::new(EventStore::new());
        let subscriptions = Arc::new(SubscriptionStore::new());
        let dlq = Arc::new(DlqStore::default());
        let metrics = Arc::new(ServiceMetrics::default());
        let queue_client: Arc<dyn QueueClient> = QueueClientFactory::create_client(QueueConfig::default())
            .await
            .expect("in-memory queue provider never fails to initialize")
            .into();
        let queue_name = QueueName::new("eventgate-events-e2e".to_string()).expect("literal queue name is valid");

        let fanout_engine = Arc::new(FanOutEngine::new(
            Arc::clone(&subscriptions),
            Arc::clone(&dlq),
            metrics.clone() as Arc<dyn MetricsCollector>,
            config.security.signing_secret.clone(),
            16,
        ));
        let runner = Arc::new(WorkflowRunner::new(
            Arc::clone(&events),
            Arc::clone(&dlq),
            metrics.clone() as Arc<dyn MetricsCollector>,
            fanout_engine,
        ));

        let state = AppState {
            config,
            events,
            subscriptions,
            dlq,
            metrics,
            queue_client: Arc::clone(&queue_client),
            queue_name: queue_name.clone(),
            health_checker: Arc::new(AlwaysHealthy),
            subscribe_limiter: Arc::new(RateLimiter::subscribe_per_hour(100)),
            sample_limiter: Arc::new(RateLimiter::sample_per_hour(60)),
        };

        let (shutdown_tx, shutdown_rx) = fanout::cancellation_pair();
        let worker = QueueDeliveryWorker::new(queue_client, queue_name, runner);
        let worker_shutdown = shutdown_rx.clone();
        let worker_handle = tokio::spawn(async move {
            worker.run(worker_shutdown).await;
        });

        let app = create_router(state.clone());
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("binding an ephemeral localhost port never fails");
        let addr = listener.local_addr().expect("bound listener has a local address");

        let mut server_shutdown_rx = shutdown_rx.clone();
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .with_graceful_shutdown(async move {
                    let _ = server_shutdown_rx.changed().await;
                })
                .await
                .expect("test server failed to serve");
        });

        TestServer {
            base_url: format!("http://{addr}"),
            state,
            shutdown: Some(shutdown_tx),
            server_handle: Some(server_handle),
            worker_handle: Some(worker_handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.worker_handle.take() {
            handle.abort();
        }
    }
}

pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.server.port = 1;
    config.security.bearer_tokens = vec!["e2e-token".to_string()];
    config.security.allowed_hostnames = vec!["hooks.example.com".to_string()];
    config.rate_limits.subscribe_per_hour = 100;
    config.rate_limits.sample_per_hour = 60;
    config
}
