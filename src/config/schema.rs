//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the console edge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the console edge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Per-IP token bucket pools.
    pub rate_limit: RateLimitConfig,

    /// Per-IP WebSocket connection limits.
    pub connections: ConnectionLimitConfig,

    /// Origin allow-list, trusted proxies, production mode.
    pub trust: TrustSettings,

    /// Directory lookup settings.
    pub ldap: LdapSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Response hardening.
    pub security: SecurityConfig,

    /// Data served by the built-in static repository.
    pub console: ConsoleData,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout for non-upgraded requests, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Policy for a single rate limiter pool.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct PoolPolicy {
    /// Refill rate in tokens per second.
    pub requests_per_second: f64,

    /// Bucket capacity.
    pub burst: u32,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// General API pool.
    pub api: PoolPolicy,

    /// Login endpoint pool.
    pub login: PoolPolicy,

    /// How often idle entries are swept, in seconds.
    pub cleanup_interval_secs: u64,

    /// Entries idle for longer than this are evicted, in seconds.
    pub idle_retention_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api: PoolPolicy {
                requests_per_second: 20.0,
                burst: 40,
            },
            // 5 attempts, then one every 12 seconds.
            login: PoolPolicy {
                requests_per_second: 5.0 / 60.0,
                burst: 5,
            },
            cleanup_interval_secs: 300,
            idle_retention_secs: 600,
        }
    }
}

/// WebSocket connection limiting.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionLimitConfig {
    /// Maximum concurrent WebSocket connections per client IP.
    pub max_per_ip: usize,

    /// How often zero-count entries are swept, in seconds.
    pub sweep_interval_secs: u64,

    /// Retry hint returned when the limit is reached, in seconds.
    pub retry_after_secs: u64,
}

/// Default for `MAX_WS_CONNECTIONS`.
pub const DEFAULT_MAX_WS_CONNECTIONS: usize = 10;

impl Default for ConnectionLimitConfig {
    fn default() -> Self {
        Self {
            max_per_ip: DEFAULT_MAX_WS_CONNECTIONS,
            sweep_interval_secs: 300,
            retry_after_secs: 5,
        }
    }
}

/// Raw trust settings as written in config or the environment.
///
/// Compiled into [`crate::security::TrustConfig`] once at startup.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TrustSettings {
    /// Origins or bare hosts allowed to make state-changing requests.
    pub allowed_origins: Vec<String>,

    /// Peers allowed to set `X-Forwarded-*` headers.
    pub trusted_proxy_cidrs: Vec<String>,

    /// Fail closed when the allow-list is empty.
    pub production: bool,
}

/// Directory lookup settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LdapSettings {
    /// Upper bound on an admin group lookup, in milliseconds.
    pub lookup_timeout_ms: u64,
}

impl Default for LdapSettings {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: 2000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// A resource entry served by the static repository.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResourceEntry {
    pub kind: String,
    pub name: String,
    /// Empty for cluster-scoped resources.
    #[serde(default)]
    pub namespace: String,
}

/// Seed data for the static repository.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ConsoleData {
    pub namespaces: Vec<String>,
    pub resources: Vec<ResourceEntry>,
}
