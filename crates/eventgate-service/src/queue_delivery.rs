//! Queue delivery glue (spec §4.2): serializes the Workflow Runner's input to
//! and from the Durable Queue's opaque message bytes, and the consumer loop
//! that drains batches into the runner.
//!
//! A dedicated module separating the fast ingress response from the slow
//! delivery path: pulls batches from a single durable queue via
//! `QueueClient::receive_messages` and feeds them to the Workflow Runner,
//! which owns its own retry policy per step (spec §4.3) rather than this
//! module retrying around it.

use chrono::Duration as ChronoDuration;
use eventgate_core::{CorrelationId, EventId, EventMetadata, Timestamp};
use eventgate_queue::{
    Message, QueueClient, QueueError, QueueName, ReceivedMessage, SerializationError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

use crate::fanout::CancellationSignal;
use crate::workflow::{WorkflowError, WorkflowInput, WorkflowOutcome, WorkflowRunner};

/// Wire envelope carried as the Durable Queue message body (spec §4.1:
/// "Enqueue carries `(event_id, payload, metadata, timestamp,
/// correlation_id, retry_attempt=0)`").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEnvelope {
    pub event_id: EventId,
    pub event_type: String,
    pub timestamp: Timestamp,
    pub payload: Value,
    pub metadata: EventMetadata,
    pub correlation_id: CorrelationId,
}

impl QueueEnvelope {
    fn into_workflow_input(self) -> WorkflowInput {
        WorkflowInput {
            event_id: self.event_id,
            event_type: self.event_type,
            timestamp: self.timestamp,
            payload: self.payload,
            metadata: self.metadata,
            correlation_id: self.correlation_id,
        }
    }
}

impl From<&WorkflowInput> for QueueEnvelope {
    fn from(input: &WorkflowInput) -> Self {
        Self {
            event_id: input.event_id.clone(),
            event_type: input.event_type.clone(),
            timestamp: input.timestamp,
            payload: input.payload.clone(),
            metadata: input.metadata.clone(),
            correlation_id: input.correlation_id,
        }
    }
}

/// Serialize `input` and place it on the Durable Queue (spec §4.1: ingress
/// persists the event row, then enqueues this envelope for the workflow to
/// pick up).
pub async fn enqueue(
    client: &dyn QueueClient,
    queue: &QueueName,
    input: &WorkflowInput,
) -> Result<(), QueueError> {
    let envelope = QueueEnvelope::from(input);
    let body = serde_json::to_vec(&envelope).map_err(SerializationError::JsonError)?;
    let message = Message::new(bytes::Bytes::from(body))
        .with_correlation_id(input.correlation_id.to_string());
    client.send_message(queue, message).await?;
    Ok(())
}

/// Batch size requested per poll (spec §4.2: "batches of up to ~100 messages").
const BATCH_SIZE: u32 = 100;

/// Backoff between polls that returned nothing, so an idle queue doesn't spin.
const IDLE_BACKOFF: Duration = Duration::from_millis(250);

/// How long a single `receive_messages` poll blocks before returning empty.
fn poll_timeout() -> ChronoDuration {
    ChronoDuration::seconds(10)
}

/// Pulls batches off the Durable Queue and feeds them to the Workflow Runner
/// (spec §4.2, §4.3), acknowledging, abandoning, or dead-lettering each
/// message according to the runner's outcome.
pub struct QueueDeliveryWorker {
    client: Arc<dyn QueueClient>,
    queue: QueueName,
    runner: Arc<WorkflowRunner>,
}

impl QueueDeliveryWorker {
    pub fn new(client: Arc<dyn QueueClient>, queue: QueueName, runner: Arc<WorkflowRunner>) -> Self {
        Self {
            client,
            queue,
            runner,
        }
    }

    /// Run the consume loop until `shutdown` fires, then return once any
    /// in-flight poll/process cycle completes.
    pub async fn run(&self, mut shutdown: CancellationSignal) {
        loop {
            if *shutdown.borrow() {
                return;
            }

            let batch = tokio::select! {
                result = self.client.receive_messages(&self.queue, BATCH_SIZE, poll_timeout()) => result,
                _ = shutdown.changed() => return,
            };

            let messages = match batch {
                Ok(messages) => messages,
                Err(error) => {
                    warn!(error = %error, "failed to poll durable queue");
                    tokio::time::sleep(IDLE_BACKOFF).await;
                    continue;
                }
            };

            if messages.is_empty() {
                tokio::time::sleep(IDLE_BACKOFF).await;
                continue;
            }

            for message in messages {
                self.process_one(message, shutdown.clone()).await;
            }
        }
    }

    async fn process_one(&self, message: ReceivedMessage, cancellation: CancellationSignal) {
        let envelope: QueueEnvelope = match serde_json::from_slice(&message.body) {
            Ok(envelope) => envelope,
            Err(error) => {
                error!(error = %error, "malformed queue message body, dead-lettering");
                self.dead_letter(message, error.to_string()).await;
                return;
            }
        };
        let event_id = envelope.event_id.clone();
        let input = envelope.into_workflow_input();

        match self.runner.process(input, cancellation).await {
            Ok(WorkflowOutcome::Delivered(_)) | Ok(WorkflowOutcome::Failed(_)) => {
                if let Err(error) = self.client.complete_message(message.receipt_handle).await {
                    error!(event_id = %event_id, error = %error, "failed to ack processed message");
                }
            }
            Err(WorkflowError::Cancelled) => {
                if let Err(error) = self.client.abandon_message(message.receipt_handle).await {
                    error!(event_id = %event_id, error = %error, "failed to abandon cancelled message");
                }
            }
            Err(WorkflowError::RowMissing { .. }) => {
                warn!(event_id = %event_id, "event row vanished mid-workflow, dead-lettering");
                self.dead_letter(message, "event row vanished mid-workflow".to_string())
                    .await;
            }
        }
    }

    async fn dead_letter(&self, message: ReceivedMessage, reason: String) {
        if let Err(error) = self
            .client
            .dead_letter_message(message.receipt_handle, reason)
            .await
        {
            error!(error = %error, "failed to dead-letter message");
        }
    }
}

#[cfg(test)]
#[path = "queue_delivery_tests.rs"]
mod tests;
