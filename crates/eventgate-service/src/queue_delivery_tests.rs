//! Tests for the Durable Queue <-> Workflow Runner glue.

use super::*;
use crate::fanout::{cancellation_pair, FanOutEngine};
use crate::stores::{DlqStore, EventStore, SubscriptionStore};
use eventgate_core::monitoring::NoOpMetricsCollector;
use eventgate_queue::{InMemoryConfig, ProviderConfig, QueueClientFactory, QueueConfig};
use std::time::Duration as StdDuration;

fn test_queue() -> QueueName {
    QueueName::new("events".to_string()).unwrap()
}

async fn test_client() -> Arc<dyn QueueClient> {
    let config = QueueConfig {
        provider: ProviderConfig::InMemory(InMemoryConfig::default()),
        ..QueueConfig::default()
    };
    let boxed = QueueClientFactory::create_client(config).await.unwrap();
    Arc::from(boxed)
}

fn sample_input() -> WorkflowInput {
    WorkflowInput {
        event_id: EventId::new(),
        event_type: "order_created".to_string(),
        timestamp: Timestamp::now(),
        payload: serde_json::json!({"amount": 10}),
        metadata: EventMetadata::default(),
        correlation_id: CorrelationId::new(),
    }
}

fn trivial_runner() -> Arc<WorkflowRunner> {
    Arc::new(WorkflowRunner::new(
        Arc::new(EventStore::new()),
        Arc::new(DlqStore::default()),
        Arc::new(NoOpMetricsCollector),
        Arc::new(FanOutEngine::new(
            Arc::new(SubscriptionStore::new()),
            Arc::new(DlqStore::default()),
            Arc::new(NoOpMetricsCollector),
            None,
            4,
        )),
    ))
}

#[tokio::test]
async fn enqueue_then_receive_round_trips_the_envelope() {
    let client = test_client().await;
    let queue = test_queue();
    let input = sample_input();

    enqueue(client.as_ref(), &queue, &input).await.unwrap();

    let received = client
        .receive_messages(&queue, 10, chrono::Duration::milliseconds(50))
        .await
        .unwrap();
    assert_eq!(received.len(), 1);
    let envelope: QueueEnvelope = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(envelope.event_id, input.event_id);
    assert_eq!(envelope.event_type, input.event_type);
}

#[tokio::test]
async fn processing_a_valid_message_acks_it() {
    let client = test_client().await;
    let queue = test_queue();
    let input = sample_input();
    enqueue(client.as_ref(), &queue, &input).await.unwrap();

    let worker = QueueDeliveryWorker::new(Arc::clone(&client), queue.clone(), trivial_runner());
    let received = client
        .receive_messages(&queue, 1, chrono::Duration::milliseconds(50))
        .await
        .unwrap();
    let message = received.into_iter().next().unwrap();
    let (_tx, cancellation) = cancellation_pair();

    worker.process_one(message, cancellation).await;

    let remaining = client
        .receive_messages(&queue, 10, chrono::Duration::milliseconds(50))
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn a_malformed_body_is_dead_lettered_not_retried_forever() {
    let client = test_client().await;
    let queue = test_queue();
    let message = Message::new(bytes::Bytes::from_static(b"not json"));
    client.send_message(&queue, message).await.unwrap();

    let worker = QueueDeliveryWorker::new(Arc::clone(&client), queue.clone(), trivial_runner());
    let received = client
        .receive_messages(&queue, 1, chrono::Duration::milliseconds(50))
        .await
        .unwrap();
    let received_message = received.into_iter().next().unwrap();
    let (_tx, cancellation) = cancellation_pair();

    worker.process_one(received_message, cancellation).await;

    // Dead-lettering drops the in-flight lock without returning the message
    // to the main queue, so a later poll finds nothing left to retry.
    let remaining = client
        .receive_messages(&queue, 10, chrono::Duration::milliseconds(50))
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn run_exits_immediately_when_shutdown_is_already_set() {
    let client = test_client().await;
    let worker = QueueDeliveryWorker::new(client, test_queue(), trivial_runner());
    let (tx, cancellation) = cancellation_pair();
    tx.send(true).unwrap();

    tokio::time::timeout(StdDuration::from_millis(200), worker.run(cancellation))
        .await
        .expect("run should return immediately once shutdown is observed");
}
