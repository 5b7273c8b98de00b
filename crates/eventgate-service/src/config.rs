//! Configuration types for the HTTP service.

use serde::{Deserialize, Serialize};

/// Service configuration, layered as defaults → config file → environment.
///
/// Environment variables use the `EVENTGATE_` prefix with double-underscore
/// nesting, e.g. `EVENTGATE_SERVER__PORT`, `EVENTGATE_SECURITY__BEARER_TOKENS`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Security settings: bearer tokens, signing secret, hostname allow-list
    pub security: SecurityConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Rate limiting windows for the Subscription API
    pub rate_limits: RateLimitConfig,

    /// Durable Queue settings (spec §4.2: retry budget, visibility timeout)
    pub queue: QueueSettings,
}

impl ServiceConfig {
    /// Load configuration from `config.toml` (if present) overridden by
    /// `EVENTGATE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::ConfigError::Parsing`] if the layered
    /// sources cannot be deserialized into [`ServiceConfig`].
    pub fn load() -> Result<Self, crate::errors::ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("EVENTGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::errors::ConfigError::Invalid {
                message: e.to_string(),
            })?;

        let parsed: Self = built
            .try_deserialize()
            .map_err(|e| crate::errors::ConfigError::Invalid {
                message: e.to_string(),
            })?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Validate the service configuration for consistency and correctness.
    ///
    /// Should be called once at startup before the service is marked ready.
    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        if self.server.port == 0 {
            return Err(crate::errors::ConfigError::Invalid {
                message: "server.port must be nonzero".to_string(),
            });
        }
        for hostname in &self.security.allowed_hostnames {
            if hostname.is_empty() {
                return Err(crate::errors::ConfigError::Invalid {
                    message: "security.allowed_hostnames entries must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Whether inbound/outbound HMAC signing is enforced for the given
    /// peer host.
    ///
    /// Resolves the open question in spec §9: signing is required exactly
    /// when a signing secret is configured and the peer is not localhost.
    pub fn signing_required_for(&self, peer_host: &str) -> bool {
        self.security.signing_secret.is_some() && !is_localhost(peer_host)
    }
}

fn is_localhost(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum ingress body size in bytes (spec §4.1: 1 MiB)
    pub max_event_body_size: usize,

    /// Maximum subscription-request body size in bytes (spec §4.8: 10 MiB)
    pub max_subscription_body_size: usize,

    /// Enable CORS
    pub enable_cors: bool,

    /// Enable compression
    pub enable_compression: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timeout_seconds: 30,
            shutdown_timeout_seconds: 30,
            max_event_body_size: 1024 * 1024,
            max_subscription_body_size: 10 * 1024 * 1024,
            enable_cors: true,
            enable_compression: true,
        }
    }
}

/// Security configuration: the Ingress API's bearer-token auth store, the
/// Subscription API's hostname allow-list, and the outbound/inbound
/// signing secret.
#[derive(Clone, Deserialize, Serialize, Default)]
pub struct SecurityConfig {
    /// Accepted bearer tokens for `POST /events`.
    #[serde(default)]
    pub bearer_tokens: Vec<String>,

    /// HMAC-SHA256 secret used for outbound signing and inbound
    /// verification. When absent, signing is never enforced.
    #[serde(default)]
    pub signing_secret: Option<String>,

    /// Hostnames permitted for subscription webhook URLs.
    #[serde(default)]
    pub allowed_hostnames: Vec<String>,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("bearer_tokens", &format!("<{} redacted>", self.bearer_tokens.len()))
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "<REDACTED>"))
            .field("allowed_hostnames", &self.allowed_hostnames)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Logging level
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Rate-limit windows for the Subscription API (spec §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests/hour permitted for `POST /zapier/hook`
    pub subscribe_per_hour: u32,

    /// Requests/hour permitted for `GET /zapier/hook`
    pub sample_per_hour: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            subscribe_per_hour: 100,
            sample_per_hour: 60,
        }
    }
}

/// Durable Queue settings (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSettings {
    /// Per-message redelivery budget before a message is dead-lettered.
    pub max_delivery_count: u32,

    /// Visibility timeout, in seconds, before an in-flight message is
    /// considered abandoned and returned to the queue.
    pub visibility_timeout_seconds: i64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_delivery_count: 5,
            visibility_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
