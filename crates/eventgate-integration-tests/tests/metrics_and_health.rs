//! Integration tests for the observability and health surface
//! (spec §6, SPEC_FULL §4.A, §6.B).

mod common;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use common::{bearer_header, test_app_state, test_config};
use eventgate_service::create_router;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn with_connect_info(mut request: Request<Body>) -> Request<Body> {
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 52341))));
    request
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let app = create_router(test_app_state(test_config()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn readiness_endpoint_reports_ready() {
    let app = create_router(test_app_state(test_config()));

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn deep_health_endpoint_reports_healthy() {
    let app = create_router(test_app_state(test_config()));

    let response = app
        .oneshot(Request::builder().uri("/health/deep").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn metrics_snapshot_reflects_ingested_events() {
    let state = test_app_state(test_config());
    let app = create_router(state.clone());

    let request = with_connect_info(
        Request::builder()
            .method("POST")
            .uri("/events")
            .header("authorization", bearer_header("test-token"))
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"event_id": "m1", "event_type": "order.created", "payload": {}}).to_string(),
            ))
            .unwrap(),
    );
    let ingest_response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(ingest_response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_events"], 1);
    assert_eq!(body["pending"], 1);
    assert_eq!(body["dlq_count"], 0);
}

#[tokio::test]
async fn prometheus_metrics_endpoint_exposes_text_format() {
    let app = create_router(test_app_state(test_config()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/internal/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("eventgate") || !text.is_empty());
}

#[tokio::test]
async fn inbox_lists_recently_ingested_events() {
    let state = test_app_state(test_config());
    let app = create_router(state.clone());

    let request = with_connect_info(
        Request::builder()
            .method("POST")
            .uri("/events")
            .header("authorization", bearer_header("test-token"))
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"event_id": "inbox-1", "event_type": "order.created", "payload": {}}).to_string(),
            ))
            .unwrap(),
    );
    app.clone().oneshot(request).await.unwrap();

    let response = app
        .oneshot(Request::builder().uri("/inbox").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event_id"], "inbox-1");
}
