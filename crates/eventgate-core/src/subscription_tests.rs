use super::*;

fn allow_list() -> Vec<String> {
    vec!["hooks.example.com".to_string()]
}

#[test]
fn new_subscription_starts_active() {
    let sub = Subscription::new("https://hooks.example.com/hooks/abc".to_string());
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(sub.retry_count, 0);
    assert!(sub.last_error.is_none());
}

#[test]
fn record_success_clears_error_and_sets_active() {
    let mut sub = Subscription::new("https://hooks.example.com/hooks/abc".to_string());
    sub.record_failure("boom");
    assert_eq!(sub.status, SubscriptionStatus::Failing);
    sub.record_success();
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert!(sub.last_error.is_none());
}

#[test]
fn record_failure_increments_retry_count() {
    let mut sub = Subscription::new("https://hooks.example.com/hooks/abc".to_string());
    sub.record_failure("HTTP 500");
    sub.record_failure("HTTP 500");
    assert_eq!(sub.retry_count, 2);
    assert_eq!(sub.status, SubscriptionStatus::Failing);
}

#[test]
fn last_error_is_truncated() {
    let mut sub = Subscription::new("https://hooks.example.com/hooks/abc".to_string());
    let long_error = "x".repeat(LAST_ERROR_MAX_LEN + 50);
    sub.record_failure(&long_error);
    let stored = sub.last_error.unwrap();
    assert!(stored.chars().count() <= LAST_ERROR_MAX_LEN + 1);
    assert!(stored.ends_with('…'));
}

#[test]
fn url_validation_rejects_non_https() {
    let err = validate_webhook_url("http://evil.example/hooks/x", &allow_list());
    assert!(err.is_err());
}

#[test]
fn url_validation_rejects_hostname_not_in_allow_list() {
    let err = validate_webhook_url("https://not-allowed.example/hooks/x", &allow_list());
    assert!(err.is_err());
}

#[test]
fn url_validation_rejects_missing_hooks_prefix() {
    let err = validate_webhook_url("https://hooks.example.com/other/x", &allow_list());
    assert!(err.is_err());
}

#[test]
fn url_validation_accepts_valid_url() {
    let ok = validate_webhook_url("https://hooks.example.com/hooks/abc", &allow_list());
    assert!(ok.is_ok());
}
