//! # EventGate HTTP Service
//!
//! HTTP server implementing the Ingress, Subscription, and Observability
//! APIs described in spec §4/§6: accept events over `POST /events`, enqueue
//! them onto the Durable Queue, and drain that queue through the Workflow
//! Runner into the Fan-out Engine in the background. Subscriptions are
//! managed over `/zapier/hook`.

pub mod config;
pub mod errors;
pub mod fanout;
pub mod health;
pub mod metrics;
pub mod queue_delivery;
pub mod rate_limiter;
pub mod responses;
pub mod stores;
pub mod workflow;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, DefaultBodyLimit, Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use eventgate_core::{
    event::EventMetadata, monitoring::MetricsCollector, CorrelationId, Event, EventGateError,
    EventId, SchemaValidator, Signer, Timestamp,
};
use eventgate_queue::{QueueClient, QueueClientFactory, QueueConfig, QueueName};
use prometheus::TextEncoder;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument, warn};

pub use config::ServiceConfig;
pub use errors::{ApiError, ConfigError, ServiceError};
pub use fanout::FanOutEngine;
pub use health::{HealthChecker, HealthStatus, ServiceHealthChecker};
pub use metrics::ServiceMetrics;
pub use queue_delivery::QueueDeliveryWorker;
pub use rate_limiter::RateLimiter;
pub use responses::*;
pub use stores::{DlqStore, EventStore, SubscriptionStore};
pub use workflow::WorkflowRunner;

/// The single Durable Queue this service enqueues onto and drains from.
/// A literal, so `.expect` at construction is a startup-time assertion
/// rather than a recoverable error path.
fn events_queue_name() -> QueueName {
    QueueName::new("eventgate-events".to_string()).expect("literal queue name is always valid")
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state handed to every handler via [`State`].
#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub events: Arc<EventStore>,
    pub subscriptions: Arc<SubscriptionStore>,
    pub dlq: Arc<DlqStore>,
    pub metrics: Arc<ServiceMetrics>,
    pub queue_client: Arc<dyn QueueClient>,
    pub queue_name: QueueName,
    pub health_checker: Arc<dyn HealthChecker>,
    pub subscribe_limiter: Arc<RateLimiter>,
    pub sample_limiter: Arc<RateLimiter>,
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Build the router: Ingress, Inbox, Subscription, and observability routes,
/// layered with tracing, compression, CORS, and the correlation-ID/security
/// header middleware.
pub fn create_router(state: AppState) -> Router {
    let ingress_routes = Router::new()
        .route("/events", post(ingress_event))
        .layer(DefaultBodyLimit::max(state.config.server.max_event_body_size));

    let inbox_routes = Router::new().route("/inbox", get(list_inbox));

    let subscription_routes = Router::new()
        .route(
            "/zapier/hook",
            post(subscribe).get(sample_event).delete(unsubscribe),
        )
        .layer(DefaultBodyLimit::max(state.config.server.max_subscription_body_size));

    let observability_routes = Router::new()
        .route("/metrics", get(metrics_snapshot))
        .route("/internal/metrics", get(prometheus_metrics));

    let health_routes = Router::new()
        .route("/health", get(handle_health_check))
        .route("/health/deep", get(handle_deep_health_check))
        .route("/ready", get(handle_readiness_check));

    Router::new()
        .merge(ingress_routes)
        .merge(inbox_routes)
        .merge(subscription_routes)
        .merge(observability_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(security_headers_middleware))
                .layer(middleware::from_fn(request_logging_middleware))
                .into_inner(),
        )
        .with_state(state)
}

/// Validate configuration, wire up stores/engines, bind, and serve until a
/// shutdown signal arrives. The queue delivery worker runs as a background
/// task alongside the HTTP listener and is cancelled once the listener has
/// stopped accepting new connections (spec §4.B: in-flight deliveries are
/// allowed to finish, bounded by their own 5s per-attempt timeout).
pub async fn start_server(config: ServiceConfig) -> Result<(), ServiceError> {
    config.validate().map_err(ServiceError::Configuration)?;

    let metrics = ServiceMetrics::new().map_err(|e| {
        ServiceError::Configuration(ConfigError::Invalid {
            message: format!("failed to initialize metrics: {e}"),
        })
    })?;

    let events = Arc::new(EventStore::new());
    let subscriptions = Arc::new(SubscriptionStore::new());
    let dlq = Arc::new(DlqStore::default());

    let fanout = Arc::new(FanOutEngine::new(
        Arc::clone(&subscriptions),
        Arc::clone(&dlq),
        metrics.clone() as Arc<dyn eventgate_core::monitoring::MetricsCollector>,
        config.security.signing_secret.clone(),
        16,
    ));
    let runner = Arc::new(WorkflowRunner::new(
        Arc::clone(&events),
        Arc::clone(&dlq),
        metrics.clone() as Arc<dyn eventgate_core::monitoring::MetricsCollector>,
        fanout,
    ));

    let queue_config = {
        let mut queue_config = QueueConfig::default();
        let in_memory = eventgate_queue::InMemoryConfig {
            max_delivery_count: config.queue.max_delivery_count,
            visibility_timeout: chrono::Duration::seconds(config.queue.visibility_timeout_seconds),
            ..eventgate_queue::InMemoryConfig::default()
        };
        queue_config.provider = eventgate_queue::ProviderConfig::InMemory(in_memory);
        queue_config
    };
    let queue_client: Arc<dyn QueueClient> = QueueClientFactory::create_client(queue_config)
        .await
        .map_err(|e| {
            ServiceError::Configuration(ConfigError::Invalid {
                message: format!("failed to initialize durable queue: {e}"),
            })
        })?
        .into();
    let queue_name = events_queue_name();

    let health_checker: Arc<dyn HealthChecker> = Arc::new(ServiceHealthChecker::new(
        Arc::clone(&events),
        Arc::clone(&subscriptions),
    ));

    let state = AppState {
        config: config.clone(),
        events,
        subscriptions,
        dlq,
        metrics,
        queue_client: Arc::clone(&queue_client),
        queue_name: queue_name.clone(),
        health_checker,
        subscribe_limiter: Arc::new(RateLimiter::subscribe_per_hour(config.rate_limits.subscribe_per_hour)),
        sample_limiter: Arc::new(RateLimiter::sample_per_hour(config.rate_limits.sample_per_hour)),
    };

    let (shutdown_tx, shutdown_rx) = fanout::cancellation_pair();
    let worker = QueueDeliveryWorker::new(queue_client, queue_name, runner);
    let worker_handle = tokio::spawn(async move {
        worker.run(shutdown_rx).await;
    });

    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: addr.to_string(),
            message: e.to_string(),
        })?;

    info!(%addr, "starting EventGate HTTP server");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| ServiceError::ServerFailed {
        message: e.to_string(),
    })?;

    let _ = shutdown_tx.send(true);
    let _ = worker_handle.await;

    info!("HTTP server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, starting graceful shutdown"),
        _ = terminate => info!("received SIGTERM, starting graceful shutdown"),
    }
}

// ============================================================================
// Ingress API (spec §4.1, §6)
// ============================================================================

#[instrument(skip(state, headers, body), fields(correlation_id))]
async fn ingress_event(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = extract_correlation_id(&headers);
    tracing::Span::current().record("correlation_id", correlation_id.to_string());

    if let Err(source) = require_bearer_auth(&state.config, &headers) {
        return ApiError::new(source, correlation_id).into_response();
    }

    match handle_ingress(&state, &headers, &body, peer, correlation_id).await {
        Ok(response) => response,
        Err(source) => ApiError::new(source, correlation_id).into_response(),
    }
}

async fn handle_ingress(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    peer: SocketAddr,
    correlation_id: CorrelationId,
) -> Result<Response, EventGateError> {
    let request: IngressRequest = serde_json::from_slice(body).map_err(|e| {
        EventGateError::Parse(eventgate_core::ParseError::InvalidFormat {
            expected: "a JSON object with event_type and payload".to_string(),
            actual: e.to_string(),
        })
    })?;

    let event_id = match request.event_id {
        Some(raw) => EventId::from_str(&raw)?,
        None => EventId::new(),
    };
    let timestamp = match request.timestamp {
        Some(raw) => Timestamp::from_rfc3339(&raw)?,
        None => Timestamp::now(),
    };

    let mut metadata = match request.metadata {
        Some(value) => serde_json::from_value::<EventMetadata>(value).map_err(|e| {
            EventGateError::Parse(eventgate_core::ParseError::InvalidFormat {
                expected: "metadata to be a JSON object".to_string(),
                actual: e.to_string(),
            })
        })?,
        None => EventMetadata::default(),
    };
    metadata.source_ip.get_or_insert_with(|| peer.ip().to_string());
    metadata.user_agent = metadata.user_agent.or_else(|| {
        headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });

    let candidate = Event::new(event_id, request.event_type, timestamp, request.payload, metadata.clone());
    candidate.validate().map_err(EventGateError::Validation)?;

    let (stored, is_new) = state.events.insert_or_get_with_inserted(candidate);

    let mut warning = None;
    if is_new {
        let input = workflow::WorkflowInput {
            event_id: stored.event_id.clone(),
            event_type: stored.event_type.clone(),
            timestamp: stored.timestamp,
            payload: stored.payload.clone(),
            metadata,
            correlation_id,
        };
        if let Err(error) = queue_delivery::enqueue(state.queue_client.as_ref(), &state.queue_name, &input).await {
            warn!(error = %error, event_id = %stored.event_id, "enqueue failed after persisting event row");
            warning = Some("event stored but enqueue failed; it will not be delivered until resubmitted".to_string());
        }
    }

    let status_code = if warning.is_some() { StatusCode::ACCEPTED } else { StatusCode::OK };

    let body = IngressResponse {
        event_id: stored.event_id.to_string(),
        status: "accepted",
        timestamp: stored.timestamp.to_rfc3339(),
        warning,
    };

    let mut response = (status_code, Json(body)).into_response();
    insert_correlation_header(&mut response, correlation_id);
    Ok(response)
}

// ============================================================================
// Inbox (spec §6: event listing)
// ============================================================================

#[instrument(skip(state))]
async fn list_inbox(State(state): State<AppState>, Query(params): Query<InboxParams>) -> Json<InboxResponse> {
    let events: Vec<EventView> = state.events.list(params.limit).iter().map(EventView::from).collect();
    Json(InboxResponse { events })
}

// ============================================================================
// Subscription API (spec §4.8, §6)
// ============================================================================

#[instrument(skip(state, headers, body), fields(correlation_id))]
async fn subscribe(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = extract_correlation_id(&headers);

    let decision = state.subscribe_limiter.check(&peer.ip().to_string());
    if !decision.allowed {
        state.metrics.record_rate_limit_exceeded("subscribe");
        return rate_limited_response(decision, correlation_id);
    }

    if state.config.signing_required_for(&peer.ip().to_string()) {
        if let Err(source) = verify_signature(&state.config, &headers, &body) {
            return ApiError::new(source, correlation_id).into_response();
        }
    }

    let request: SubscriptionUrlRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            let source = EventGateError::Parse(eventgate_core::ParseError::InvalidFormat {
                expected: "a JSON object with a url field".to_string(),
                actual: e.to_string(),
            });
            return ApiError::new(source, correlation_id).into_response();
        }
    };

    if let Err(validation_error) =
        eventgate_core::subscription::validate_webhook_url(&request.url, &state.config.security.allowed_hostnames)
    {
        return ApiError::new(EventGateError::Validation(validation_error), correlation_id).into_response();
    }

    match state.subscriptions.insert(request.url.clone()) {
        Ok(subscription) => {
            let mut response = (StatusCode::CREATED, Json(SubscriptionResponse::from(&subscription))).into_response();
            insert_correlation_header(&mut response, correlation_id);
            response
        }
        Err(stores::subscription_store::DuplicateUrl) => {
            let source = EventGateError::Conflict {
                resource: "subscription".to_string(),
                id: request.url,
            };
            ApiError::new(source, correlation_id).into_response()
        }
    }
}

#[instrument(skip(state, headers))]
async fn sample_event(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let correlation_id = extract_correlation_id(&headers);

    let decision = state.sample_limiter.check(&peer.ip().to_string());
    if !decision.allowed {
        state.metrics.record_rate_limit_exceeded("sample");
        return rate_limited_response(decision, correlation_id);
    }

    let now = Timestamp::now();
    let document = json!({
        "event_id": EventId::new().to_string(),
        "event_type": "eventgate.sample",
        "timestamp": now.to_rfc3339(),
        "payload": {"message": "this is a sample event from EventGate"},
        "metadata": {"correlation_id": correlation_id.to_string()},
        "created_at": now.to_rfc3339(),
    });

    if let Err(schema_error) = SchemaValidator.validate(&document) {
        let source = EventGateError::Internal {
            message: format!("generated sample failed schema validation: {schema_error}"),
        };
        return ApiError::new(source, correlation_id).into_response();
    }

    let signature = state.config.security.signing_secret.as_ref().map(|secret| {
        let bytes = serde_json::to_vec(&document).expect("validated sample document serializes");
        Signer::header_value(&bytes, secret)
    });

    let mut response = Json(SampleResponse {
        events: vec![document],
        signature,
    })
    .into_response();
    insert_correlation_header(&mut response, correlation_id);
    response
}

#[instrument(skip(state, headers, body), fields(correlation_id))]
async fn unsubscribe(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let correlation_id = extract_correlation_id(&headers);

    let request: SubscriptionUrlRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            let source = EventGateError::Parse(eventgate_core::ParseError::InvalidFormat {
                expected: "a JSON object with a url field".to_string(),
                actual: e.to_string(),
            });
            return ApiError::new(source, correlation_id).into_response();
        }
    };

    match state.subscriptions.delete_by_url(&request.url) {
        Some(_) => {
            let mut response = Json(UnsubscribeResponse {
                url: request.url,
                status: "removed",
            })
            .into_response();
            insert_correlation_header(&mut response, correlation_id);
            response
        }
        None => {
            let source = EventGateError::NotFound {
                resource: "subscription".to_string(),
                id: request.url,
            };
            ApiError::new(source, correlation_id).into_response()
        }
    }
}

// ============================================================================
// Observability (spec §6, SPEC_FULL §6.B)
// ============================================================================

#[instrument(skip(state))]
async fn metrics_snapshot(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    let counts = state.events.counts();
    let last_processed_at = match state.metrics.store.get(metrics::keys::LAST_PROCESSED_AT) {
        Some(stores::metrics_store::MetricValue::Timestamp(ts)) => Some(ts.to_rfc3339()),
        _ => None,
    };
    let processing_rate = if counts.total > 0 {
        counts.delivered as f64 / counts.total as f64
    } else {
        0.0
    };

    Json(MetricsSnapshot {
        total_events: counts.total,
        pending: counts.pending,
        delivered: counts.delivered,
        failed: counts.failed,
        queue_depth: state.metrics.store.get_counter(metrics::keys::QUEUE_DEPTH),
        dlq_count: state.dlq.count(),
        last_processed_at,
        processing_rate,
    })
}

#[instrument(skip_all)]
async fn prometheus_metrics() -> Result<String, StatusCode> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

// ============================================================================
// Health Check Handlers (SPEC_FULL §4.A)
// ============================================================================

#[instrument(skip(state))]
async fn handle_health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    let status = state.health_checker.check_basic_health().await;
    health_response(status)
}

#[instrument(skip(state))]
async fn handle_deep_health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    let status = state.health_checker.check_deep_health().await;
    health_response(status)
}

fn health_response(status: HealthStatus) -> Result<Json<HealthResponse>, StatusCode> {
    let response = HealthResponse {
        status: if status.is_healthy { "healthy".to_string() } else { "unhealthy".to_string() },
        timestamp: Timestamp::now(),
        checks: status.checks,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    if status.is_healthy {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

#[instrument(skip(state))]
async fn handle_readiness_check(State(state): State<AppState>) -> Result<Json<ReadinessResponse>, StatusCode> {
    let ready = state.health_checker.check_readiness().await;
    let response = ReadinessResponse {
        ready,
        timestamp: Timestamp::now(),
    };
    if ready {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

// ============================================================================
// Shared request helpers
// ============================================================================

fn extract_correlation_id(headers: &HeaderMap) -> CorrelationId {
    headers
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| CorrelationId::from_str(s).ok())
        .unwrap_or_default()
}

fn insert_correlation_header(response: &mut Response, correlation_id: CorrelationId) {
    if let Ok(value) = correlation_id.to_string().parse() {
        response.headers_mut().insert("X-Correlation-ID", value);
    }
}

fn require_bearer_auth(config: &ServiceConfig, headers: &HeaderMap) -> Result<(), EventGateError> {
    let auth_error = || EventGateError::Auth {
        message: "missing or invalid bearer token".to_string(),
    };

    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(auth_error)?;
    let token = header.strip_prefix("Bearer ").ok_or_else(auth_error)?;

    if config.security.bearer_tokens.iter().any(|t| t == token) {
        Ok(())
    } else {
        Err(auth_error())
    }
}

fn verify_signature(config: &ServiceConfig, headers: &HeaderMap, body: &[u8]) -> Result<(), EventGateError> {
    let auth_error = || EventGateError::Auth {
        message: "missing or invalid signature".to_string(),
    };

    let secret = config.security.signing_secret.as_deref().ok_or_else(auth_error)?;
    let header = headers
        .get("x-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(auth_error)?;
    let signature_hex = Signer::parse_header(header).ok_or_else(auth_error)?;

    if Signer::verify(body, signature_hex, secret) {
        Ok(())
    } else {
        Err(auth_error())
    }
}

fn rate_limited_response(decision: rate_limiter::RateLimitDecision, correlation_id: CorrelationId) -> Response {
    let source = EventGateError::RateLimited {
        retry_after_secs: decision.reset_after.as_secs(),
    };
    let mut response = ApiError::new(source, correlation_id).into_response();
    let headers = response.headers_mut();
    if let Ok(v) = decision.limit.to_string().parse() {
        headers.insert("X-RateLimit-Limit", v);
    }
    if let Ok(v) = decision.remaining.to_string().parse() {
        headers.insert("X-RateLimit-Remaining", v);
    }
    if let Ok(v) = decision.reset_after.as_secs().to_string().parse() {
        headers.insert("X-RateLimit-Reset", v);
    }
    response
}

// ============================================================================
// Middleware
// ============================================================================

/// Extract or generate a correlation ID, log request start/completion, and
/// propagate the ID through the response header.
#[instrument(skip(request, next), fields(method = %request.method(), uri = %request.uri()))]
async fn request_logging_middleware(request: axum::extract::Request, next: axum::middleware::Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let mut response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(%method, %uri, %status, duration_ms = %duration.as_millis(), "request completed with server error");
    } else if status.is_client_error() {
        tracing::warn!(%method, %uri, %status, duration_ms = %duration.as_millis(), "request completed with client error");
    } else {
        tracing::info!(%method, %uri, %status, duration_ms = %duration.as_millis(), "request completed");
    }

    if !response.headers().contains_key("X-Correlation-ID") {
        if let Some(correlation_id) = response.extensions().get::<CorrelationId>().copied() {
            insert_correlation_header(&mut response, correlation_id);
        }
    }

    response
}

/// Security headers applied to every response (spec §4.8).
async fn security_headers_middleware(request: axum::extract::Request, next: axum::middleware::Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("X-Content-Type-Options", "nosniff".parse().unwrap());
    headers.insert("X-Frame-Options", "DENY".parse().unwrap());
    headers.insert(
        "Strict-Transport-Security",
        "max-age=31536000; includeSubDomains".parse().unwrap(),
    );
    response
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
