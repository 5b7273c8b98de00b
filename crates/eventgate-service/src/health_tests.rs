use super::*;

#[tokio::test]
async fn fresh_stores_report_healthy_and_ready() {
    let checker = ServiceHealthChecker::new(Arc::new(EventStore::new()), Arc::new(SubscriptionStore::new()));

    assert!(checker.check_basic_health().await.is_healthy);
    let deep = checker.check_deep_health().await;
    assert!(deep.is_healthy);
    assert_eq!(deep.checks.get("event_store").map(String::as_str), Some("ok"));
    assert!(checker.check_readiness().await);
}
