use super::*;

#[test]
fn dlq_entry_within_retention_when_fresh() {
    let entry = DlqEntry::new(
        SubscriptionId::new(),
        EventId::new(),
        "https://hooks.example.com/hooks/a".to_string(),
        CorrelationId::new(),
        "HTTP 500".to_string(),
        Some(500),
    );
    assert!(entry.within_retention(DEFAULT_RETENTION));
}

#[test]
fn dlq_entry_outside_retention_when_old() {
    let mut entry = DlqEntry::new(
        SubscriptionId::new(),
        EventId::new(),
        "https://hooks.example.com/hooks/a".to_string(),
        CorrelationId::new(),
        "HTTP 500".to_string(),
        Some(500),
    );
    // Simulate an entry from 8 days ago.
    let eight_days_ago = Timestamp::from_rfc3339(
        &(chrono::Utc::now() - chrono::Duration::days(8)).to_rfc3339(),
    )
    .unwrap();
    entry.failed_at = eight_days_ago;
    assert!(!entry.within_retention(DEFAULT_RETENTION));
}

#[test]
fn event_dlq_entry_carries_reason_and_correlation() {
    let event_id = EventId::new();
    let correlation_id = CorrelationId::new();
    let entry = EventDlqEntry::new(
        event_id.clone(),
        EventDlqReason::ValidationFailed {
            message: "missing event_id".to_string(),
        },
        correlation_id,
    );
    assert_eq!(entry.event_id, event_id);
    assert_eq!(entry.correlation_id, correlation_id);
    assert!(entry.within_retention(DEFAULT_RETENTION));
}
