//! Provider types and configuration.
//!
//! Only the in-memory backend is implemented; `ProviderType`/`ProviderConfig`
//! remain enums so a durable backend can be added later without disturbing
//! `QueueClient` call sites.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Enumeration of supported queue providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderType {
    InMemory,
}

impl ProviderType {
    /// Check if provider supports batch operations.
    pub fn supports_batching(&self) -> bool {
        match self {
            Self::InMemory => true,
        }
    }

    /// Get maximum message size for provider.
    pub fn max_message_size(&self) -> usize {
        match self {
            Self::InMemory => 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Configuration for queue client initialization.
///
/// Provider-specific knobs (retry budget, visibility timeout, dead-letter
/// behavior) live on the provider's own config (e.g. [`InMemoryConfig`])
/// rather than duplicated here, since a durable backend's equivalents
/// rarely share the in-memory provider's shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    pub provider: ProviderConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::InMemory(InMemoryConfig::default()),
        }
    }
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProviderConfig {
    InMemory(InMemoryConfig),
}

/// In-memory provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryConfig {
    pub max_queue_size: usize,
    pub enable_persistence: bool,
    pub max_delivery_count: u32,
    pub default_message_ttl: Option<Duration>,
    pub enable_dead_letter_queue: bool,
    pub visibility_timeout: Duration,
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 10000,
            enable_persistence: false,
            // spec §4.2: "implementation-configurable (default 5)"
            max_delivery_count: 5,
            default_message_ttl: None,
            enable_dead_letter_queue: true,
            visibility_timeout: Duration::seconds(30),
        }
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
