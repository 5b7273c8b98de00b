//! Health and readiness checks (SPEC_FULL §4.A).
//!
//! `HealthChecker` is a small abstraction the HTTP layer depends on rather
//! than reaching into individual stores directly, so a future backend with
//! a real liveness probe (a database connection, a queue broker) can
//! implement it without touching the handlers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::stores::{EventStore, SubscriptionStore};

/// Result of a health check, carrying per-dependency detail for `/health/deep`.
#[derive(Debug, Clone, Default)]
pub struct HealthStatus {
    pub is_healthy: bool,
    pub checks: HashMap<String, String>,
}

#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// Liveness: the process is up and able to respond.
    async fn check_basic_health(&self) -> HealthStatus;

    /// Readiness-adjacent dependency checks (store reachability).
    async fn check_deep_health(&self) -> HealthStatus;

    /// Whether the service is ready to receive traffic behind a load balancer.
    async fn check_readiness(&self) -> bool;
}

/// The concrete checker backing this service's in-memory stores. Since none
/// of them perform real I/O, every check is trivially healthy once the
/// stores exist; the trait boundary is what matters for a future durable
/// backend, not the current implementation's depth.
pub struct ServiceHealthChecker {
    events: Arc<EventStore>,
    subscriptions: Arc<SubscriptionStore>,
}

impl ServiceHealthChecker {
    pub fn new(events: Arc<EventStore>, subscriptions: Arc<SubscriptionStore>) -> Self {
        Self {
            events,
            subscriptions,
        }
    }
}

#[async_trait]
impl HealthChecker for ServiceHealthChecker {
    async fn check_basic_health(&self) -> HealthStatus {
        HealthStatus {
            is_healthy: true,
            checks: HashMap::new(),
        }
    }

    async fn check_deep_health(&self) -> HealthStatus {
        let mut checks = HashMap::new();
        let _ = self.events.counts();
        checks.insert("event_store".to_string(), "ok".to_string());
        let _ = self.subscriptions.list_all();
        checks.insert("subscription_store".to_string(), "ok".to_string());
        HealthStatus {
            is_healthy: true,
            checks,
        }
    }

    async fn check_readiness(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
