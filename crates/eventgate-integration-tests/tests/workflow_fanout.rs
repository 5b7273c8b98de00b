//! Integration tests for the full ingress -> queue -> workflow -> fan-out
//! pipeline (spec §4.2, §4.3, §4.4).

mod common;

use common::{drain_queue_for, test_app_state, test_config};
use eventgate_core::event::EventMetadata;
use eventgate_core::{CorrelationId, EventId, EventStatus, Timestamp};
use eventgate_service::workflow::WorkflowInput;
use std::time::Duration;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn input(event_id: EventId, event_type: &str, payload: serde_json::Value) -> WorkflowInput {
    WorkflowInput {
        event_id,
        event_type: event_type.to_string(),
        timestamp: Timestamp::now(),
        payload,
        metadata: EventMetadata::default(),
        correlation_id: CorrelationId::new(),
    }
}

#[tokio::test]
async fn delivered_event_reaches_the_subscriber_with_a_signature() {
    let mut config = test_config();
    config.security.signing_secret = Some("topsecret".to_string());
    let state = test_app_state(config);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/sub"))
        .and(header_exists("X-Signature"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let url = format!("{}/hooks/sub", server.uri());
    state.subscriptions.insert(url).unwrap();

    let event_id = EventId::new();
    let workflow_input = input(event_id.clone(), "order.created", serde_json::json!({"amount": 10}));
    eventgate_service::queue_delivery::enqueue(state.queue_client.as_ref(), &state.queue_name, &workflow_input)
        .await
        .unwrap();

    drain_queue_for(&state, Duration::from_secs(2)).await;

    let stored = state.events.get(&event_id).unwrap();
    assert_eq!(stored.status, EventStatus::Delivered);

    let subscriptions = state.subscriptions.list_all();
    assert_eq!(
        subscriptions[0].status,
        eventgate_core::subscription::SubscriptionStatus::Active
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].headers.get("x-event-id").unwrap().to_str().unwrap(),
        event_id.to_string()
    );
}

#[tokio::test]
async fn subscriber_recovers_after_transient_failures() {
    let state = test_app_state(test_config());
    let server = MockServer::start().await;

    // First two attempts fail, third succeeds; `up_to_n_times` scopes each
    // mock to a bounded number of matches so the sequence is deterministic.
    Mock::given(method("POST"))
        .and(path("/hooks/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hooks/flaky"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let url = format!("{}/hooks/flaky", server.uri());
    state.subscriptions.insert(url).unwrap();

    let event_id = EventId::new();
    let workflow_input = input(event_id.clone(), "order.created", serde_json::json!({}));
    eventgate_service::queue_delivery::enqueue(state.queue_client.as_ref(), &state.queue_name, &workflow_input)
        .await
        .unwrap();

    // Two retries at 2s then 4s before the third attempt succeeds.
    drain_queue_for(&state, Duration::from_secs(9)).await;

    let stored = state.events.get(&event_id).unwrap();
    assert_eq!(stored.status, EventStatus::Delivered);
    assert_eq!(state.dlq.count(), 0);
}

#[tokio::test]
async fn subscriber_that_never_succeeds_is_dead_lettered() {
    let state = test_app_state(test_config());
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/sub"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let url = format!("{}/hooks/sub", server.uri());
    state.subscriptions.insert(url).unwrap();

    let event_id = EventId::new();
    let workflow_input = input(event_id.clone(), "order.created", serde_json::json!({}));
    eventgate_service::queue_delivery::enqueue(state.queue_client.as_ref(), &state.queue_name, &workflow_input)
        .await
        .unwrap();

    // 4 total attempts with 2s/4s/8s backoff: allow the full budget to elapse.
    drain_queue_for(&state, Duration::from_secs(16)).await;

    // The workflow still marks the event delivered once fan-out has run its
    // course; only the per-subscription outcome and the DLQ record the
    // failure (§4.3: fan-out's own result doesn't gate step 4).
    let stored = state.events.get(&event_id).unwrap();
    assert_eq!(stored.status, EventStatus::Delivered);

    let subscriptions = state.subscriptions.list_all();
    assert_eq!(
        subscriptions[0].status,
        eventgate_core::subscription::SubscriptionStatus::Failing
    );
    assert_eq!(subscriptions[0].retry_count, 1);

    assert_eq!(state.dlq.count(), 1);
    let failures = state.dlq.list_delivery_failures(10);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].event_id, event_id);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}
