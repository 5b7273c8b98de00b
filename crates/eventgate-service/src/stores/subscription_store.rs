//! Subscription Store (spec §3, §4.8): row-oriented store of outbound
//! webhook subscriptions keyed by `url`, exclusively owned by the
//! Subscription API for inserts/deletes and the Fan-out Engine for status
//! transitions.

use eventgate_core::{Subscription, SubscriptionId, SubscriptionStatus};
use std::collections::HashMap;
use std::sync::RwLock;

/// Conflict returned when registering a URL that is already subscribed
/// (§3 invariant: "URL is unique across the active set").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateUrl;

/// In-memory subscription store.
#[derive(Debug, Default)]
pub struct SubscriptionStore {
    by_url: RwLock<HashMap<String, SubscriptionId>>,
    by_id: RwLock<HashMap<SubscriptionId, Subscription>>,
}

impl SubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscription. Rejects a duplicate `url` with
    /// [`DuplicateUrl`] (§3, §4.8: "reject duplicates with a conflict code").
    pub fn insert(&self, url: String) -> Result<Subscription, DuplicateUrl> {
        let mut by_url = self.by_url.write().expect("subscription store lock poisoned");
        if by_url.contains_key(&url) {
            return Err(DuplicateUrl);
        }
        let subscription = Subscription::new(url.clone());
        by_url.insert(url, subscription.id);
        self.by_id
            .write()
            .expect("subscription store lock poisoned")
            .insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    pub fn get_by_url(&self, url: &str) -> Option<Subscription> {
        let id = *self
            .by_url
            .read()
            .expect("subscription store lock poisoned")
            .get(url)?;
        self.by_id
            .read()
            .expect("subscription store lock poisoned")
            .get(&id)
            .cloned()
    }

    /// Delete the subscription matching `url`. Returns `None` if it did not
    /// exist (§4.8: "404 if no row existed").
    pub fn delete_by_url(&self, url: &str) -> Option<Subscription> {
        let id = self
            .by_url
            .write()
            .expect("subscription store lock poisoned")
            .remove(url)?;
        self.by_id
            .write()
            .expect("subscription store lock poisoned")
            .remove(&id)
    }

    /// Snapshot of every subscription with `status=active` (§4.4 step 1).
    pub fn list_active(&self) -> Vec<Subscription> {
        self.by_id
            .read()
            .expect("subscription store lock poisoned")
            .values()
            .filter(|s| s.status == SubscriptionStatus::Active)
            .cloned()
            .collect()
    }

    pub fn list_all(&self) -> Vec<Subscription> {
        self.by_id
            .read()
            .expect("subscription store lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Record a successful delivery against a subscription (§4.4: "set
    /// subscription `status=active` ... clear `last_error`").
    pub fn record_success(&self, id: SubscriptionId) {
        if let Some(sub) = self
            .by_id
            .write()
            .expect("subscription store lock poisoned")
            .get_mut(&id)
        {
            sub.record_success();
        }
    }

    /// Record exhaustion of the delivery retry budget (§4.4: "set
    /// subscription `status=failing`, `retry_count++`").
    pub fn record_failure(&self, id: SubscriptionId, error: &str) {
        if let Some(sub) = self
            .by_id
            .write()
            .expect("subscription store lock poisoned")
            .get_mut(&id)
        {
            sub.record_failure(error);
        }
    }

    /// Record a pre-delivery schema validation failure without changing the
    /// subscription's status (§4.4: "not the subscriber's fault").
    pub fn record_validation_error(&self, id: SubscriptionId, error: &str) {
        if let Some(sub) = self
            .by_id
            .write()
            .expect("subscription store lock poisoned")
            .get_mut(&id)
        {
            sub.record_validation_error(error);
        }
    }
}

#[cfg(test)]
#[path = "subscription_store_tests.rs"]
mod tests;
