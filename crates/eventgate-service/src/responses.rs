//! Request/response DTOs for the HTTP surface (spec §6).
//!
//! Kept separate from the wire types in `lib.rs`'s routing and handler
//! bodies.

use eventgate_core::{Event, EventStatus, Subscription, SubscriptionStatus, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body accepted by `POST /events` (spec §4.1: `{payload, metadata?}`).
/// `event_type` is additionally required here since it is a mandatory
/// field of the stored [`Event`] row; callers that omit it get a 400
/// exactly as they would for any other missing required field.
#[derive(Debug, Deserialize)]
pub struct IngressRequest {
    /// Caller-assigned opaque id; server-assigned (ULID) when absent.
    #[serde(default)]
    pub event_id: Option<String>,
    pub event_type: String,
    /// ISO-8601; defaults to the server's receipt time when absent.
    #[serde(default)]
    pub timestamp: Option<String>,
    pub payload: Value,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Response body for `POST /events` (spec §4.1: `{event_id, status, timestamp}`).
#[derive(Debug, Serialize)]
pub struct IngressResponse {
    pub event_id: String,
    pub status: &'static str,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// One row in `GET /inbox`'s listing.
#[derive(Debug, Serialize)]
pub struct EventView {
    pub event_id: String,
    pub event_type: String,
    pub status: EventStatus,
    pub timestamp: String,
    pub created_at: String,
    pub updated_at: String,
    pub retry_count: u32,
}

impl From<&Event> for EventView {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.event_id.to_string(),
            event_type: event.event_type.clone(),
            status: event.status,
            timestamp: event.timestamp.to_rfc3339(),
            created_at: event.created_at.to_rfc3339(),
            updated_at: event.updated_at.to_rfc3339(),
            retry_count: event.retry_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InboxResponse {
    pub events: Vec<EventView>,
}

/// Query parameters accepted by `GET /inbox`.
#[derive(Debug, Deserialize)]
pub struct InboxParams {
    #[serde(default = "default_inbox_limit")]
    pub limit: usize,
}

fn default_inbox_limit() -> usize {
    100
}

/// Body shared by `POST /zapier/hook` and `DELETE /zapier/hook`.
#[derive(Debug, Deserialize)]
pub struct SubscriptionUrlRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub url: String,
    pub status: SubscriptionStatus,
    pub created_at: String,
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(subscription: &Subscription) -> Self {
        Self {
            id: subscription.id.to_string(),
            url: subscription.url.clone(),
            status: subscription.status,
            created_at: subscription.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnsubscribeResponse {
    pub url: String,
    pub status: &'static str,
}

/// Response body for `GET /metrics` (spec §6: the JSON counter snapshot).
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_events: u64,
    pub pending: u64,
    pub delivered: u64,
    pub failed: u64,
    pub queue_depth: i64,
    pub dlq_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_processed_at: Option<String>,
    pub processing_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: Timestamp,
    pub checks: std::collections::HashMap<String, String>,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub timestamp: Timestamp,
}

/// Response body for `GET /zapier/hook` (spec §4.8 Sample): a signed,
/// schema-valid synthetic event a new subscriber can use to verify its
/// webhook handler before real traffic arrives.
#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub events: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}
