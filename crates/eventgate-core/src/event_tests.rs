use super::*;
use serde_json::json;

fn sample_event() -> Event {
    Event::new(
        EventId::new(),
        "order_created".to_string(),
        Timestamp::now(),
        json!({"amount": 42}),
        EventMetadata::default(),
    )
}

#[test]
fn new_event_starts_pending_with_zero_retries() {
    let event = sample_event();
    assert_eq!(event.status, EventStatus::Pending);
    assert_eq!(event.retry_count, 0);
    assert_eq!(event.created_at, event.updated_at);
}

#[test]
fn pending_is_not_terminal() {
    assert!(!EventStatus::Pending.is_terminal());
    assert!(EventStatus::Delivered.is_terminal());
    assert!(EventStatus::Failed.is_terminal());
}

#[test]
fn mark_delivered_is_idempotent() {
    let mut event = sample_event();
    event.mark_delivered();
    let first_updated_at = event.updated_at;
    event.mark_delivered();
    assert_eq!(event.status, EventStatus::Delivered);
    assert_eq!(event.updated_at, first_updated_at);
}

#[test]
fn event_type_length_boundaries() {
    assert!(validate_event_type(&"a".repeat(1)).is_ok());
    assert!(validate_event_type(&"a".repeat(255)).is_ok());
    assert!(validate_event_type("").is_err());
    assert!(validate_event_type(&"a".repeat(256)).is_err());
}

#[test]
fn event_type_rejects_invalid_characters() {
    assert!(validate_event_type("order-created").is_err());
    assert!(validate_event_type("order created").is_err());
    assert!(validate_event_type("order_created_1").is_ok());
}

#[test]
fn payload_key_count_boundaries() {
    let mut map = serde_json::Map::new();
    for i in 0..100 {
        map.insert(format!("k{i}"), json!(i));
    }
    assert!(validate_payload_shape(&Value::Object(map.clone())).is_ok());

    map.insert("k100".to_string(), json!(100));
    assert!(validate_payload_shape(&Value::Object(map)).is_err());
}

#[test]
fn payload_must_be_object() {
    assert!(validate_payload_shape(&json!([1, 2, 3])).is_err());
    assert!(validate_payload_shape(&json!("not an object")).is_err());
}

#[test]
fn event_metadata_round_trips_recognized_and_extra_keys() {
    let mut extra = HashMap::new();
    extra.insert("custom".to_string(), json!("value"));
    let metadata = EventMetadata {
        correlation_id: Some("corr-1".to_string()),
        source_ip: Some("10.0.0.1".to_string()),
        user_agent: None,
        extra,
    };
    let serialized = serde_json::to_value(&metadata).unwrap();
    let deserialized: EventMetadata = serde_json::from_value(serialized).unwrap();
    assert_eq!(deserialized.correlation_id.as_deref(), Some("corr-1"));
    assert_eq!(deserialized.extra.get("custom"), Some(&json!("value")));
}
