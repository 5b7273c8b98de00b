use super::*;

#[test]
fn in_memory_provider_supports_batching_with_large_messages() {
    assert!(ProviderType::InMemory.supports_batching());
    assert_eq!(ProviderType::InMemory.max_message_size(), 10 * 1024 * 1024);
}

#[test]
fn queue_config_defaults_to_in_memory_provider() {
    let config = QueueConfig::default();
    assert!(matches!(config.provider, ProviderConfig::InMemory(_)));
}

#[test]
fn in_memory_config_defaults_match_documented_retry_budget() {
    let config = InMemoryConfig::default();
    assert_eq!(config.max_queue_size, 10000);
    assert!(!config.enable_persistence);
    assert!(config.enable_dead_letter_queue);
    assert_eq!(config.max_delivery_count, 5);
    assert_eq!(config.visibility_timeout, Duration::seconds(30));
}
