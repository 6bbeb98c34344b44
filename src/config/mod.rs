//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → config file (TOML, optional)
//!     → environment overrides (ALLOWED_ORIGINS, MAX_WS_CONNECTIONS, ...)
//!     → validation.rs (semantic checks)
//!     → ConsoleConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; trust settings never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env, load_config, ConfigError};
pub use schema::{
    ConnectionLimitConfig, ConsoleConfig, ConsoleData, LdapSettings, ListenerConfig, LogFormat,
    ObservabilityConfig, PoolPolicy, RateLimitConfig, ResourceEntry, SecurityConfig,
    TrustSettings,
};
