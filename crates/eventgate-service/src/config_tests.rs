//! Tests for service configuration.

use super::*;

#[test]
fn default_config_is_valid() {
    let config = ServiceConfig::default();
    assert!(config.validate().is_ok());
}

#[test]
fn zero_port_is_rejected() {
    let mut config = ServiceConfig::default();
    config.server.port = 0;
    assert!(config.validate().is_err());
}

#[test]
fn empty_allowed_hostname_is_rejected() {
    let mut config = ServiceConfig::default();
    config.security.allowed_hostnames.push(String::new());
    assert!(config.validate().is_err());
}

#[test]
fn signing_not_required_without_a_secret() {
    let config = ServiceConfig::default();
    assert!(!config.signing_required_for("hooks.example.com"));
}

#[test]
fn signing_required_with_secret_outside_localhost() {
    let mut config = ServiceConfig::default();
    config.security.signing_secret = Some("s3cret".to_string());
    assert!(config.signing_required_for("hooks.example.com"));
    assert!(!config.signing_required_for("localhost"));
    assert!(!config.signing_required_for("127.0.0.1"));
}

#[test]
fn default_rate_limits_match_spec() {
    let config = ServiceConfig::default();
    assert_eq!(config.rate_limits.subscribe_per_hour, 100);
    assert_eq!(config.rate_limits.sample_per_hour, 60);
}

#[test]
fn default_queue_settings_match_spec_retry_budget() {
    let config = ServiceConfig::default();
    assert_eq!(config.queue.max_delivery_count, 5);
    assert_eq!(config.queue.visibility_timeout_seconds, 30);
}

#[test]
fn security_config_debug_redacts_secrets() {
    let mut security = SecurityConfig::default();
    security.bearer_tokens.push("tok-1".to_string());
    security.signing_secret = Some("s3cret".to_string());
    let debug = format!("{:?}", security);
    assert!(!debug.contains("tok-1"));
    assert!(!debug.contains("s3cret"));
}
