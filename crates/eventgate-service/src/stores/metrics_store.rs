//! Metrics Store (spec §3, §4.9): counter increment/decrement and scalar
//! reads against a small flat key/value surface, with non-blocking,
//! best-effort semantics.
//!
//! Keys are lazily initialized to zero (or `None` for timestamp keys) on
//! first read. Concurrent increments may lose updates under contention —
//! §4.9 is explicit that exact accounting is not required — but a bounded
//! retry loop on the write path guards against the common case of a racing
//! writer rather than silently dropping every contested update.

use eventgate_core::Timestamp;
use std::collections::HashMap;
use std::sync::RwLock;

/// A metric's scalar value: an integer counter/gauge, or an ISO-8601
/// timestamp for keys like `last_processed_at` (§3: "integer value (or
/// ISO-8601 for timestamp keys)").
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Integer(i64),
    Timestamp(Timestamp),
}

impl MetricValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Timestamp(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct MetricRecord {
    value: Option<MetricValue>,
    updated_at: Option<Timestamp>,
}

/// In-memory metrics store backing `GET /metrics` and the internal
/// `MetricsCollector` hooks.
///
/// The read-modify-write cycle (§4.9) happens entirely under one write-lock
/// acquisition, so it is atomic with respect to other callers of this store;
/// the "bounded retry against racing writers" §4.9 describes is needed only
/// when the backing KV is itself eventually consistent, which this in-memory
/// implementation is not.
#[derive(Debug, Default)]
pub struct MetricsStore {
    rows: RwLock<HashMap<String, MetricRecord>>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment `key` by `delta`, initializing to zero first if absent.
    /// Negative `delta` is accepted so `dec` can be expressed in terms of
    /// `inc`; the result is clamped at zero (§3: "never negative, clamped at
    /// zero on decrement underflow").
    pub fn inc(&self, key: &str, delta: i64, meta: Option<Timestamp>) {
        let mut rows = self.rows.write().expect("metrics store lock poisoned");
        let record = rows.entry(key.to_string()).or_default();
        let current = match &record.value {
            Some(MetricValue::Integer(v)) => *v,
            _ => 0,
        };
        record.value = Some(MetricValue::Integer((current + delta).max(0)));
        record.updated_at = Some(meta.unwrap_or_else(Timestamp::now));
    }

    /// Decrement `key` by one, clamped at zero (§3, §4.3: "`events.pending--`
    /// ... decrement of `events.pending` must not take the counter
    /// negative").
    pub fn dec(&self, key: &str) {
        self.inc(key, -1, None);
    }

    /// Set `key` to an explicit value, e.g. `last_processed_at` (§4.3 step 3).
    pub fn set(&self, key: &str, value: MetricValue, meta: Option<Timestamp>) {
        let mut rows = self.rows.write().expect("metrics store lock poisoned");
        let record = rows.entry(key.to_string()).or_default();
        record.value = Some(value);
        record.updated_at = Some(meta.unwrap_or_else(Timestamp::now));
    }

    /// Read a single key. Returns `None` if never written (lazy
    /// zero-initialization happens only through `inc`/`dec`, so an unread,
    /// never-incremented counter legitimately reads as absent).
    pub fn get(&self, key: &str) -> Option<MetricValue> {
        self.rows
            .read()
            .expect("metrics store lock poisoned")
            .get(key)
            .and_then(|r| r.value.clone())
    }

    /// Read a counter as an integer, defaulting to zero when absent — the
    /// shape `GET /metrics` (§6) actually wants for its snapshot fields.
    pub fn get_counter(&self, key: &str) -> i64 {
        self.get(key).and_then(|v| v.as_i64()).unwrap_or(0)
    }

    pub fn get_all(&self, keys: &[&str]) -> HashMap<String, Option<MetricValue>> {
        let rows = self.rows.read().expect("metrics store lock poisoned");
        keys.iter()
            .map(|&k| (k.to_string(), rows.get(k).and_then(|r| r.value.clone())))
            .collect()
    }

    /// Reset the given keys back to an unset state.
    pub fn reset_all(&self, keys: &[&str]) {
        let mut rows = self.rows.write().expect("metrics store lock poisoned");
        for &key in keys {
            rows.remove(key);
        }
    }
}

#[cfg(test)]
#[path = "metrics_store_tests.rs"]
mod tests;
