//! Event entity and lifecycle (spec §3, §4.3).

use crate::{EventId, Timestamp, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Maximum number of top-level keys allowed in an event payload (§3, §8).
pub const MAX_PAYLOAD_KEYS: usize = 100;

/// Event status. Monotone with respect to the workflow's final step: never
/// regresses from `Delivered` to `Pending` (§3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Delivered,
    Failed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        }
    }

    /// `Pending` is the only non-terminal status (§3 invariant: "pending is
    /// not terminal").
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A unit of data accepted at ingress and fanned out to subscribers (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    pub event_type: String,
    pub timestamp: Timestamp,
    pub payload: Value,
    pub metadata: EventMetadata,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub status: EventStatus,
    pub retry_count: u32,
}

/// Recognized metadata keys (§3): `correlation_id`, `source_ip`, `user_agent`.
/// Unrecognized keys are preserved in `extra` so round-tripping through the
/// store does not silently drop caller-supplied fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Event {
    /// Construct a new event as the Ingress API does: `status=pending`,
    /// `retry_count=0`, `created_at == updated_at == now` (§4.1).
    pub fn new(
        event_id: EventId,
        event_type: String,
        timestamp: Timestamp,
        payload: Value,
        metadata: EventMetadata,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            event_id,
            event_type,
            timestamp,
            payload,
            metadata,
            created_at: now,
            updated_at: now,
            status: EventStatus::Pending,
            retry_count: 0,
        }
    }

    /// Validate the structural invariants from §3/§4.5/§8: `event_type`
    /// matches `[A-Za-z0-9_]{1,255}`, and `payload` has at most
    /// [`MAX_PAYLOAD_KEYS`] top-level keys.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_event_type(&self.event_type)?;
        validate_payload_shape(&self.payload)
    }

    /// Transition to `delivered`, bumping `updated_at`. No-op if already
    /// delivered (§4.3 step 4: "idempotent: re-running on an already-
    /// delivered row is a no-op").
    pub fn mark_delivered(&mut self) {
        if self.status == EventStatus::Delivered {
            return;
        }
        self.status = EventStatus::Delivered;
        self.updated_at = Timestamp::now();
    }

    /// Transition to `failed`, bumping `updated_at` (§4.3 terminal failure path).
    pub fn mark_failed(&mut self) {
        self.status = EventStatus::Failed;
        self.updated_at = Timestamp::now();
    }
}

/// Validate `event_type` against `[A-Za-z0-9_]{1,255}` (§3, boundary cases
/// in §8: length 0 or 256 rejected, 1 and 255 accepted).
pub fn validate_event_type(event_type: &str) -> Result<(), ValidationError> {
    if event_type.is_empty() {
        return Err(ValidationError::Required {
            field: "event_type".to_string(),
        });
    }
    if event_type.len() > 255 {
        return Err(ValidationError::TooLong {
            field: "event_type".to_string(),
            max_length: 255,
        });
    }
    if !event_type
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::InvalidCharacters {
            field: "event_type".to_string(),
            invalid_chars: "must match [A-Za-z0-9_]".to_string(),
        });
    }
    Ok(())
}

/// Validate that `payload` is a JSON object with at most
/// [`MAX_PAYLOAD_KEYS`] top-level keys (§3, boundary cases in §8: 100
/// accepted, 101 rejected).
pub fn validate_payload_shape(payload: &Value) -> Result<(), ValidationError> {
    let object = payload.as_object().ok_or_else(|| ValidationError::InvalidFormat {
        field: "payload".to_string(),
        message: "must be a JSON object".to_string(),
    })?;
    if object.len() > MAX_PAYLOAD_KEYS {
        return Err(ValidationError::TooManyKeys {
            field: "payload".to_string(),
            actual: object.len(),
            max_keys: MAX_PAYLOAD_KEYS,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
