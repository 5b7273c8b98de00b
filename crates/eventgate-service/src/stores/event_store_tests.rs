use super::*;
use eventgate_core::{event::EventMetadata, Timestamp};
use serde_json::json;

fn sample_event() -> Event {
    Event::new(
        EventId::new(),
        "order.created".to_string(),
        Timestamp::now(),
        json!({"k": "v"}),
        EventMetadata::default(),
    )
}

#[test]
fn insert_or_get_is_idempotent_for_the_same_event_id() {
    let store = EventStore::new();
    let event = sample_event();
    let id = event.event_id.clone();

    let first = store.insert_or_get(event.clone());
    let mut duplicate = event.clone();
    duplicate.payload = json!({"different": true});
    let second = store.insert_or_get(duplicate);

    assert_eq!(first.event_id, second.event_id);
    assert_eq!(second.payload, event.payload, "second insert must not overwrite the first row");
    assert_eq!(store.counts().total, 1);
    assert!(store.get(&id).is_some());
}

#[test]
fn update_transitions_status_and_is_a_no_op_for_missing_rows() {
    let store = EventStore::new();
    let event = sample_event();
    let id = event.event_id.clone();
    store.insert_or_get(event);

    let updated = store.update(&id, |e| e.mark_delivered()).unwrap();
    assert_eq!(updated.status, EventStatus::Delivered);

    assert!(store.update(&EventId::new(), |e| e.mark_delivered()).is_none());
}

#[test]
fn counts_match_total_invariant() {
    let store = EventStore::new();
    let a = sample_event();
    let b = sample_event();
    let c = sample_event();
    store.insert_or_get(a.clone());
    store.insert_or_get(b.clone());
    store.insert_or_get(c.clone());
    store.update(&a.event_id, |e| e.mark_delivered());
    store.update(&b.event_id, |e| e.mark_failed());

    let counts = store.counts();
    assert_eq!(counts.total, counts.pending + counts.delivered + counts.failed);
    assert_eq!(counts.delivered, 1);
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.pending, 1);
}

#[test]
fn insert_or_get_with_inserted_reports_the_winner_only_once() {
    let store = EventStore::new();
    let event = sample_event();

    let (first, first_is_new) = store.insert_or_get_with_inserted(event.clone());
    let (second, second_is_new) = store.insert_or_get_with_inserted(event.clone());

    assert!(first_is_new);
    assert!(!second_is_new);
    assert_eq!(first.event_id, second.event_id);
    assert_eq!(store.counts().total, 1);
}

#[test]
fn list_orders_newest_first_and_respects_limit() {
    let store = EventStore::new();
    for _ in 0..5 {
        store.insert_or_get(sample_event());
    }
    let listed = store.list(2);
    assert_eq!(listed.len(), 2);
}
