//! Per-client-IP rate limiter for the Subscription API (spec §4.7).
//!
//! A fixed-window approximation, as §4.7 explicitly permits ("exact
//! sub-second accuracy is not required"). A single `Arc<RwLock<..>>` guards
//! a small map of per-key windows, cheap enough that rate-limit checks
//! never need to await (§5: "rate-limit checks are cheap and do not block
//! on external I/O").

use eventgate_core::Timestamp;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

/// One client's current window: how many requests it has made, and when the
/// window resets.
#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Timestamp,
}

/// Outcome of a rate-limit check, carrying the values for the standard
/// `X-RateLimit-*` headers and, on rejection, `Retry-After` (§4.7).
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

/// A single fixed-window limiter for one logical endpoint (e.g. "subscribe"
/// or "sample"), keyed per client IP.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: RwLock<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Per §4.7: 100 requests/hour for subscription registration.
    pub fn subscribe_per_hour(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(3600))
    }

    /// Per §4.7: 60 requests/hour for the sample/test endpoint.
    pub fn sample_per_hour(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(3600))
    }

    /// Check and consume one request from `client_key`'s window.
    pub fn check(&self, client_key: &str) -> RateLimitDecision {
        let now = Timestamp::now();
        let mut windows = self.windows.write().expect("rate limiter lock poisoned");

        let window = windows.entry(client_key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now.add_seconds(self.window.as_secs()),
        });

        if now >= window.reset_at {
            window.count = 0;
            window.reset_at = now.add_seconds(self.window.as_secs());
        }

        let reset_after = window.reset_at.duration_since(now);

        if window.count >= self.limit {
            return RateLimitDecision {
                allowed: false,
                limit: self.limit,
                remaining: 0,
                reset_after,
            };
        }

        window.count += 1;
        RateLimitDecision {
            allowed: true,
            limit: self.limit,
            remaining: self.limit - window.count,
            reset_after,
        }
    }
}

#[cfg(test)]
#[path = "rate_limiter_tests.rs"]
mod tests;
