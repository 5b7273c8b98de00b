//! Tests for the Workflow Runner.

use super::*;
use crate::stores::SubscriptionStore;
use eventgate_core::monitoring::NoOpMetricsCollector;
use eventgate_core::EventStatus;
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn runner(fanout: Arc<FanOutEngine>) -> WorkflowRunner {
    WorkflowRunner::new(
        Arc::new(EventStore::new()),
        Arc::new(DlqStore::default()),
        Arc::new(NoOpMetricsCollector),
        fanout,
    )
}

fn trivial_fanout() -> Arc<FanOutEngine> {
    Arc::new(FanOutEngine::new(
        Arc::new(SubscriptionStore::new()),
        Arc::new(DlqStore::default()),
        Arc::new(NoOpMetricsCollector),
        None,
        4,
    ))
}

fn valid_input() -> WorkflowInput {
    WorkflowInput {
        event_id: EventId::new(),
        event_type: "order_created".to_string(),
        timestamp: eventgate_core::Timestamp::now(),
        payload: json!({"amount": 10}),
        metadata: EventMetadata::default(),
        correlation_id: CorrelationId::new(),
    }
}

#[tokio::test]
async fn a_valid_event_ends_up_delivered() {
    let runner = runner(trivial_fanout());
    let (_tx, cancellation) = crate::fanout::cancellation_pair();

    let outcome = runner.process(valid_input(), cancellation).await.unwrap();

    match outcome {
        WorkflowOutcome::Delivered(event) => assert_eq!(event.status, EventStatus::Delivered),
        WorkflowOutcome::Failed(_) => panic!("expected delivery"),
    }
}

#[tokio::test]
async fn an_invalid_event_type_ends_up_failed_and_writes_event_dlq() {
    let mut input = valid_input();
    input.event_type = "has spaces".to_string();

    let events = Arc::new(EventStore::new());
    let dlq = Arc::new(DlqStore::default());
    let runner = WorkflowRunner::new(
        Arc::clone(&events),
        Arc::clone(&dlq),
        Arc::new(NoOpMetricsCollector),
        trivial_fanout(),
    );
    let (_tx, cancellation) = crate::fanout::cancellation_pair();

    let outcome = runner.process(input, cancellation).await.unwrap();

    match outcome {
        WorkflowOutcome::Failed(event) => assert_eq!(event.status, EventStatus::Failed),
        WorkflowOutcome::Delivered(_) => panic!("expected failure"),
    }
    assert_eq!(dlq.list_event_failures(10).len(), 1);
}

#[tokio::test]
async fn replaying_an_already_delivered_event_is_a_no_op() {
    let events = Arc::new(EventStore::new());
    let runner = WorkflowRunner::new(
        Arc::clone(&events),
        Arc::new(DlqStore::default()),
        Arc::new(NoOpMetricsCollector),
        trivial_fanout(),
    );
    let input = valid_input();
    let (_tx, cancellation) = crate::fanout::cancellation_pair();

    let first = runner.process(input.clone(), cancellation.clone()).await.unwrap();
    let WorkflowOutcome::Delivered(first_event) = first else {
        panic!("expected delivery");
    };

    let second = runner.process(input, cancellation).await.unwrap();
    let WorkflowOutcome::Delivered(second_event) = second else {
        panic!("expected delivery");
    };

    assert_eq!(first_event.updated_at, second_event.updated_at);
}

#[tokio::test]
async fn cancellation_before_fan_out_leaves_the_event_pending() {
    let events = Arc::new(EventStore::new());
    let runner = WorkflowRunner::new(
        Arc::clone(&events),
        Arc::new(DlqStore::default()),
        Arc::new(NoOpMetricsCollector),
        trivial_fanout(),
    );
    let (tx, cancellation) = crate::fanout::cancellation_pair();
    tx.send(true).unwrap();

    let result = runner.process(valid_input(), cancellation).await;
    assert!(matches!(result, Err(WorkflowError::Cancelled)));
}

#[tokio::test]
async fn fan_out_reaches_the_subscriber_before_the_delivered_transition() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let subscriptions = Arc::new(SubscriptionStore::new());
    subscriptions.insert(format!("{}/hooks/a", server.uri())).unwrap();
    let fanout = Arc::new(FanOutEngine::new(
        subscriptions,
        Arc::new(DlqStore::default()),
        Arc::new(NoOpMetricsCollector),
        None,
        4,
    ));
    let runner = runner(fanout);
    let (_tx, cancellation) = crate::fanout::cancellation_pair();

    let outcome = runner.process(valid_input(), cancellation).await.unwrap();
    assert!(matches!(outcome, WorkflowOutcome::Delivered(_)));
}
