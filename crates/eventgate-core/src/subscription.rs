//! Subscription entity and lifecycle (spec §3, §4.8).

use crate::{SubscriptionId, Timestamp, ValidationError};
use serde::{Deserialize, Serialize};

/// Status of an outbound webhook subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Failing,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Failing => "failing",
        }
    }
}

/// A persistent record of an outbound webhook URL expected to receive
/// events (§3). The natural key is `url`; `id` is an opaque handle used by
/// the store and the DLQ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub url: String,
    pub status: SubscriptionStatus,
    pub created_at: Timestamp,
    pub last_tested_at: Option<Timestamp>,
    pub last_error: Option<String>,
    pub retry_count: u32,
}

/// Maximum length a truncated `last_error` message is allowed to reach (§3:
/// "last_error (nullable, truncated)").
pub const LAST_ERROR_MAX_LEN: usize = 1024;

impl Subscription {
    /// Construct a subscription as the Subscription API's register handler
    /// does: `status=active`, `retry_count=0` (§4.8).
    pub fn new(url: String) -> Self {
        Self {
            id: SubscriptionId::new(),
            url,
            status: SubscriptionStatus::Active,
            created_at: Timestamp::now(),
            last_tested_at: None,
            last_error: None,
            retry_count: 0,
        }
    }

    /// Record a successful delivery: returns to `active`, clears `last_error`.
    pub fn record_success(&mut self) {
        self.status = SubscriptionStatus::Active;
        self.last_tested_at = Some(Timestamp::now());
        self.last_error = None;
    }

    /// Record exhaustion of the retry budget for one delivery: transitions
    /// to `failing`, bumps `retry_count`, truncates and stores `last_error`.
    pub fn record_failure(&mut self, error: &str) {
        self.status = SubscriptionStatus::Failing;
        self.retry_count += 1;
        self.last_tested_at = Some(Timestamp::now());
        self.last_error = Some(truncate_error(error));
    }

    /// Record a pre-delivery schema validation failure: the payload, not the
    /// subscriber, is at fault (§4.4), so `status`/`retry_count` are left
    /// unchanged and only `last_error` is updated.
    pub fn record_validation_error(&mut self, error: &str) {
        self.last_tested_at = Some(Timestamp::now());
        self.last_error = Some(truncate_error(error));
    }
}

fn truncate_error(error: &str) -> String {
    if error.len() <= LAST_ERROR_MAX_LEN {
        error.to_string()
    } else {
        let mut truncated: String = error.chars().take(LAST_ERROR_MAX_LEN).collect();
        truncated.push('…');
        truncated
    }
}

/// Validate a webhook URL against §4.8's policy: HTTPS only, hostname in an
/// allow-list, path prefixed with `/hooks`.
pub fn validate_webhook_url(url: &str, allowed_hostnames: &[String]) -> Result<(), ValidationError> {
    let parsed = url::Url::parse(url).map_err(|_| ValidationError::InvalidFormat {
        field: "url".to_string(),
        message: "not a valid URL".to_string(),
    })?;

    if parsed.scheme() != "https" {
        return Err(ValidationError::InvalidFormat {
            field: "url".to_string(),
            message: "scheme must be https".to_string(),
        });
    }

    let host = parsed.host_str().ok_or_else(|| ValidationError::InvalidFormat {
        field: "url".to_string(),
        message: "missing host".to_string(),
    })?;
    if !allowed_hostnames.iter().any(|allowed| allowed == host) {
        return Err(ValidationError::InvalidFormat {
            field: "url".to_string(),
            message: format!("hostname '{host}' is not in the allow-list"),
        });
    }

    if !parsed.path().starts_with("/hooks") {
        return Err(ValidationError::InvalidFormat {
            field: "url".to_string(),
            message: "path must start with /hooks".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
