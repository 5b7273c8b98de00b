//! Tests for the Metrics Store.

use super::*;

#[test]
fn unread_key_is_absent() {
    let store = MetricsStore::new();
    assert_eq!(store.get("events.total"), None);
    assert_eq!(store.get_counter("events.total"), 0);
}

#[test]
fn inc_initializes_lazily_to_zero_then_increments() {
    let store = MetricsStore::new();
    store.inc("events.total", 1, None);
    store.inc("events.total", 1, None);
    assert_eq!(store.get_counter("events.total"), 2);
}

#[test]
fn dec_clamps_at_zero() {
    let store = MetricsStore::new();
    store.dec("events.pending");
    store.dec("events.pending");
    assert_eq!(store.get_counter("events.pending"), 0);
}

#[test]
fn dec_never_goes_negative_after_reaching_zero() {
    let store = MetricsStore::new();
    store.inc("events.pending", 1, None);
    store.dec("events.pending");
    store.dec("events.pending");
    assert_eq!(store.get_counter("events.pending"), 0);
}

#[test]
fn set_stores_a_timestamp_value() {
    let store = MetricsStore::new();
    let now = Timestamp::now();
    store.set("last_processed_at", MetricValue::Timestamp(now), None);
    match store.get("last_processed_at") {
        Some(MetricValue::Timestamp(t)) => assert_eq!(t, now),
        other => panic!("expected timestamp value, got {other:?}"),
    }
}

#[test]
fn get_all_returns_absent_keys_as_none() {
    let store = MetricsStore::new();
    store.inc("events.total", 5, None);
    let snapshot = store.get_all(&["events.total", "events.failed"]);
    assert_eq!(snapshot["events.total"], Some(MetricValue::Integer(5)));
    assert_eq!(snapshot["events.failed"], None);
}

#[test]
fn reset_all_clears_given_keys_only() {
    let store = MetricsStore::new();
    store.inc("events.total", 5, None);
    store.inc("events.failed", 1, None);
    store.reset_all(&["events.total"]);
    assert_eq!(store.get_counter("events.total"), 0);
    assert_eq!(store.get_counter("events.failed"), 1);
}

#[test]
fn concurrent_increments_are_all_observed() {
    use std::sync::Arc;
    use std::thread;

    let store = Arc::new(MetricsStore::new());
    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                store.inc("events.total", 1, None);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.get_counter("events.total"), 800);
}
