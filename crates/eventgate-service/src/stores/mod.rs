//! Concrete store implementations backing the domain (spec §3).
//!
//! Each store owns exactly one entity kind and is the sole writer of that
//! entity's mutable fields, per §3's ownership rules: the Event Store owns
//! `status`/`retry_count` on events; the Subscription Store owns `status`/
//! `last_error` on subscriptions. All stores here are in-memory, guarded by
//! `std::sync::RwLock` around a plain `HashMap`.

pub mod dlq_store;
pub mod event_store;
pub mod metrics_store;
pub mod subscription_store;

pub use dlq_store::DlqStore;
pub use event_store::EventStore;
pub use metrics_store::MetricsStore;
pub use subscription_store::SubscriptionStore;
