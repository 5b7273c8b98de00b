//! Workflow Runner (spec §4.3): the durable 4-step event pipeline —
//! validate, store, update-metrics, mark-delivered — with per-step retry
//! and a terminal-failure path to the event-failure DLQ namespace.
//!
//! Each step is idempotent so that resuming a redelivered message after a
//! crash never double-counts metrics or re-delivers a webhook that already
//! succeeded on a prior attempt (the Fan-out Engine's own per-subscription
//! status transition already makes *that* half idempotent).

use eventgate_core::monitoring::MetricsCollector;
use eventgate_core::{CorrelationId, Event, EventDlqEntry, EventDlqReason, EventId, EventMetadata};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

use crate::fanout::{CancellationSignal, FanOutEngine};
use crate::stores::{DlqStore, EventStore};

/// Terminal outcome of running the workflow once for a message.
#[derive(Debug)]
pub enum WorkflowOutcome {
    /// The event was stored, fanned out, and marked `delivered` (or already
    /// was — step 4 is a no-op on replay).
    Delivered(Event),
    /// The event failed validation and was moved straight to `failed`
    /// (spec §4.3 step 1: "terminal failure on invariant violation, not
    /// retried").
    Failed(Event),
}

/// Non-terminal problems running the workflow: the caller (the queue
/// delivery glue) should leave the message unacknowledged so it is
/// redelivered.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("workflow cancelled before completion")]
    Cancelled,
    #[error("event row vanished mid-workflow for {event_id}")]
    RowMissing { event_id: EventId },
}

/// Input accepted from the Durable Queue (spec §4.1: "Enqueue carries
/// `(event_id, payload, metadata, timestamp, correlation_id,
/// retry_attempt=0)`").
#[derive(Debug, Clone)]
pub struct WorkflowInput {
    pub event_id: EventId,
    pub event_type: String,
    pub timestamp: eventgate_core::Timestamp,
    pub payload: Value,
    pub metadata: EventMetadata,
    pub correlation_id: CorrelationId,
}

pub struct WorkflowRunner {
    events: Arc<EventStore>,
    dlq: Arc<DlqStore>,
    metrics: Arc<dyn MetricsCollector>,
    fanout: Arc<FanOutEngine>,
}

impl WorkflowRunner {
    pub fn new(
        events: Arc<EventStore>,
        dlq: Arc<DlqStore>,
        metrics: Arc<dyn MetricsCollector>,
        fanout: Arc<FanOutEngine>,
    ) -> Self {
        Self {
            events,
            dlq,
            metrics,
            fanout,
        }
    }

    /// Run the full pipeline for one input (spec §4.3 steps 1-4, plus the
    /// fan-out that step 4 folds in before the `delivered` transition
    /// commits).
    #[instrument(skip(self, input, cancellation), fields(event_id = %input.event_id))]
    pub async fn process(
        &self,
        input: WorkflowInput,
        cancellation: CancellationSignal,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let started = Instant::now();

        let candidate = Event::new(
            input.event_id,
            input.event_type,
            input.timestamp,
            input.payload,
            input.metadata,
        );

        // Step 1: validate (terminal, not retried).
        if let Err(validation_error) = candidate.validate() {
            let failed = self.terminal_validation_failure(candidate, &validation_error, input.correlation_id);
            return Ok(WorkflowOutcome::Failed(failed));
        }

        if *cancellation.borrow() {
            return Err(WorkflowError::Cancelled);
        }

        // Step 2: store (idempotent upsert). The in-memory store is
        // infallible, so there is no transient-error path to retry against;
        // a fallible store would slot a retry loop in at this call site
        // without changing anything above or below it.
        let stored = self.events.insert_or_get(candidate);

        // Step 4 no-op fast path: a redelivered message for an
        // already-delivered row short-circuits before re-running fan-out.
        if stored.status == eventgate_core::EventStatus::Delivered {
            return Ok(WorkflowOutcome::Delivered(stored));
        }

        if *cancellation.borrow() {
            return Err(WorkflowError::Cancelled);
        }

        // Step 3: update-metrics (secondary, best-effort).
        let metrics_started = Instant::now();
        self.metrics.record_event_accepted();
        self.metrics.record_event_status_transition("", "pending");
        self.metrics
            .record_workflow_step_duration("update-metrics", metrics_started.elapsed());

        if *cancellation.borrow() {
            return Err(WorkflowError::Cancelled);
        }

        // Fan-out, then step 4: mark-delivered.
        let fanout_started = Instant::now();
        self.fanout.fan_out(&stored, input.correlation_id, cancellation).await;
        self.metrics
            .record_workflow_step_duration("fan-out", fanout_started.elapsed());

        let delivered = self
            .events
            .update(&stored.event_id, |event| event.mark_delivered())
            .ok_or(WorkflowError::RowMissing {
                event_id: stored.event_id.clone(),
            })?;
        self.metrics.record_event_status_transition("pending", "delivered");

        self.metrics
            .record_workflow_step_duration("workflow", started.elapsed());

        Ok(WorkflowOutcome::Delivered(delivered))
    }

    fn terminal_validation_failure(
        &self,
        mut candidate: Event,
        validation_error: &eventgate_core::ValidationError,
        correlation_id: CorrelationId,
    ) -> Event {
        candidate.mark_failed();
        let stored = self.events.insert_or_get(candidate);
        self.dlq.put_event_failure(EventDlqEntry::new(
            stored.event_id.clone(),
            EventDlqReason::ValidationFailed {
                message: validation_error.to_string(),
            },
            correlation_id,
        ));
        self.metrics.record_event_status_transition("", "failed");
        self.metrics.record_error("validation", false);
        self.metrics.record_dlq_write();
        stored
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
