//! # EventGate Core
//!
//! Domain types and contracts for the EventGate event ingestion and fan-out
//! service: identifiers, the error taxonomy, retry policy, and the trait
//! boundaries (`MetricsCollector`) that infrastructure crates implement.
//!
//! ## Architecture
//!
//! The core follows clean architecture principles:
//! - Business logic depends only on trait abstractions
//! - Infrastructure implementations are injected at runtime
//! - All external dependencies are abstracted behind traits
//!
//! ## Usage
//!
//! ```rust
//! use eventgate_core::{CorrelationId, EventId};
//!
//! let event_id = EventId::new();
//! let correlation_id = CorrelationId::new();
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use ulid::Ulid;
pub use uuid::Uuid;

/// Standard result type for EventGate operations
pub type EventGateResult<T> = Result<T, EventGateError>;

// ============================================================================
// Domain Identifier Types
// ============================================================================

/// Unique identifier for events.
///
/// The Ingress API assigns a ULID-derived string when the caller omits
/// `event_id` (§4.1), but a caller may also supply its own opaque token
/// (§8 scenario 1 uses `event_id=e1`), so this wraps a validated `String`
/// rather than a `Ulid` directly — anything matching §4.5's
/// `[A-Za-z0-9_-]{1,255}` pattern round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(String);

impl EventId {
    /// Generate a new unique, server-assigned event ID.
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Get the string representation of the event ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Event IDs may be assigned by the caller (§4.1): any token
        // matching the §4.5 schema pattern is accepted, not only
        // well-formed ULIDs.
        if s.is_empty() || s.len() > 255 {
            return Err(ParseError::InvalidFormat {
                expected: "1-255 chars matching [A-Za-z0-9_-]+".to_string(),
                actual: s.to_string(),
            });
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(ParseError::InvalidFormat {
                expected: "1-255 chars matching [A-Za-z0-9_-]+".to_string(),
                actual: s.to_string(),
            });
        }
        Ok(Self(s.to_string()))
    }
}

/// Identifier for tracing a request across system boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a new correlation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the string representation.
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CorrelationId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = s.parse::<Uuid>().map_err(|_| ParseError::InvalidFormat {
            expected: "UUID format".to_string(),
            actual: s.to_string(),
        })?;
        Ok(Self(uuid))
    }
}

/// Opaque identifier for a subscription; natural key remains the URL (§3),
/// this id is what the Subscription Store and DLQ key on internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Generate a new subscription id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the string representation.
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubscriptionId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = s.parse::<Uuid>().map_err(|_| ParseError::InvalidFormat {
            expected: "UUID format".to_string(),
            actual: s.to_string(),
        })?;
        Ok(Self(uuid))
    }
}

// ============================================================================
// Time Types
// ============================================================================

/// UTC timestamp, serialized as RFC3339/ISO-8601 so it round-trips exactly
/// as required by the Event and Subscription schemas (§3, §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wrap an existing `chrono` UTC datetime.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parse from an RFC3339 string.
    pub fn from_rfc3339(s: &str) -> Result<Self, ParseError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|_| ParseError::InvalidFormat {
                expected: "RFC3339 datetime".to_string(),
                actual: s.to_string(),
            })?
            .with_timezone(&Utc);
        Ok(Self(dt))
    }

    /// Render as an RFC3339 string.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }

    /// Underlying `chrono` value.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Add a duration of whole seconds.
    pub fn add_seconds(&self, seconds: u64) -> Self {
        Self(self.0 + chrono::Duration::seconds(seconds as i64))
    }

    /// Elapsed duration since an earlier timestamp (zero if `other` is later).
    pub fn duration_since(&self, other: Self) -> Duration {
        self.0
            .signed_duration_since(other.0)
            .to_std()
            .unwrap_or_default()
    }

    /// Whether this timestamp falls within `ttl` of now.
    pub fn within_ttl(&self, ttl: Duration) -> bool {
        Self::now().duration_since(*self) <= ttl
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

// ============================================================================
// Configuration Types
// ============================================================================

/// Deployment environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    /// Whether a host should be treated as "localhost" for the purposes of
    /// the signing-requirement rule in §6/§9.
    pub fn is_local_host(host: &str) -> bool {
        matches!(host, "localhost" | "127.0.0.1" | "::1")
    }
}

impl FromStr for Environment {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" | "stage" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ParseError::InvalidFormat {
                expected: "development, staging, or production".to_string(),
                actual: s.to_string(),
            }),
        }
    }
}

/// Logging level configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(ParseError::InvalidFormat {
                expected: "error, warn, info, debug, or trace".to_string(),
                actual: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// High-level error categorization, mirroring the taxonomy in spec §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    Validation,
    Auth,
    RateLimit,
    NotFound,
    Conflict,
    TransientStore,
    TransientNetwork,
    Upstream,
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::TransientStore => "transient_store",
            Self::TransientNetwork => "transient_network",
            Self::Upstream => "upstream",
            Self::Internal => "internal",
        }
    }

    /// Whether an error in this category is retried per §7's propagation policy.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransientStore | Self::TransientNetwork | Self::Upstream
        )
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for input validation failures.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' has invalid format: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    TooLong { field: String, max_length: usize },

    #[error("Field '{field}' is below minimum length of {min_length}")]
    TooShort { field: String, min_length: usize },

    #[error("Field '{field}' contains invalid characters: {invalid_chars}")]
    InvalidCharacters {
        field: String,
        invalid_chars: String,
    },

    #[error("Object '{field}' has {actual} keys, exceeding the maximum of {max_keys}")]
    TooManyKeys {
        field: String,
        actual: usize,
        max_keys: usize,
    },
}

/// Error type for string parsing failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid format: expected {expected}, got '{actual}'")]
    InvalidFormat { expected: String, actual: String },
}

/// Top-level error type for EventGate domain operations.
#[derive(Debug, thiserror::Error)]
pub enum EventGateError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Authentication error: {message}")]
    Auth { message: String },

    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("{resource} '{id}' not found")]
    NotFound { resource: String, id: String },

    #[error("{resource} '{id}' already exists")]
    Conflict { resource: String, id: String },

    #[error("Store error: {message}")]
    TransientStore { message: String },

    #[error("Network error: {message}")]
    TransientNetwork { message: String },

    #[error("Upstream responded with {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EventGateError {
    /// Whether this error is transient and should be retried per §7.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::TransientStore { .. } | Self::TransientNetwork { .. } | Self::Upstream { .. }
        )
    }

    /// Error category for monitoring, logging, and the user-visible machine code.
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::Parse(_) => ErrorCategory::Validation,
            Self::Auth { .. } => ErrorCategory::Auth,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::TransientStore { .. } => ErrorCategory::TransientStore,
            Self::TransientNetwork { .. } => ErrorCategory::TransientNetwork,
            Self::Upstream { .. } => ErrorCategory::Upstream,
            Self::Configuration { .. } | Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Stable machine-readable code surfaced to callers (§7).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Parse(_) => "INVALID_JSON",
            Self::Auth { .. } => "UNAUTHORIZED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::TransientStore { .. } => "STORE_UNAVAILABLE",
            Self::TransientNetwork { .. } => "NETWORK_ERROR",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

// ============================================================================
// Module declarations
// ============================================================================

/// Event entity, status, and lifecycle per spec §3.
pub mod event;

/// Subscription entity, status, and lifecycle per spec §3.
pub mod subscription;

/// HMAC-SHA256 signing and constant-time verification per spec §4.6.
pub mod signer;

/// Structural validation of event payloads per spec §4.5.
pub mod schema;

/// Dead-letter entry types per spec §3/§4.10.
pub mod dlq;

/// Retry policy and backoff state shared by the Durable Queue and Fan-out Engine.
pub mod retry;

/// `MetricsCollector` trait boundary implemented by the infrastructure layer.
pub mod monitoring;

pub use dlq::{DlqEntry, EventDlqEntry, EventDlqReason};
pub use event::{Event, EventStatus};
pub use retry::{RetryPolicy, RetryState};
pub use schema::{SchemaError, SchemaValidator};
pub use signer::Signer;
pub use subscription::{Subscription, SubscriptionStatus};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
