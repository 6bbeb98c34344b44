//! Configuration validation.
//!
//! Semantic checks run after serde has handled syntax. All errors are
//! collected rather than stopping at the first one.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{ConsoleConfig, PoolPolicy};
use crate::security::proxy::parse_proxy_cidr;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &ConsoleConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            "must be a socket address",
        ));
    }

    check_pool("rate_limit.api", &config.rate_limit.api, &mut errors);
    check_pool("rate_limit.login", &config.rate_limit.login, &mut errors);

    if config.rate_limit.cleanup_interval_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.cleanup_interval_secs",
            "must be greater than zero",
        ));
    }
    if config.connections.max_per_ip == 0 {
        errors.push(ValidationError::new(
            "connections.max_per_ip",
            "must be greater than zero",
        ));
    }
    if config.connections.sweep_interval_secs == 0 {
        errors.push(ValidationError::new(
            "connections.sweep_interval_secs",
            "must be greater than zero",
        ));
    }

    for origin in &config.trust.allowed_origins {
        if origin.contains('*') {
            errors.push(ValidationError::new(
                "trust.allowed_origins",
                format!("wildcard origin {origin:?} is not supported"),
            ));
        }
    }
    for cidr in &config.trust.trusted_proxy_cidrs {
        if parse_proxy_cidr(cidr).is_none() {
            errors.push(ValidationError::new(
                "trust.trusted_proxy_cidrs",
                format!("{cidr:?} is not a CIDR or IP address"),
            ));
        }
    }

    if config.trust.production && config.trust.allowed_origins.is_empty() {
        tracing::warn!(
            "Production mode with an empty origin allow-list: all state-changing requests will be rejected"
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_pool(field: &str, policy: &PoolPolicy, errors: &mut Vec<ValidationError>) {
    if !(policy.requests_per_second.is_finite() && policy.requests_per_second > 0.0) {
        errors.push(ValidationError::new(
            format!("{field}.requests_per_second"),
            "must be a positive number",
        ));
    }
    if policy.burst == 0 {
        errors.push(ValidationError::new(
            format!("{field}.burst"),
            "must be greater than zero",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ConsoleConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = ConsoleConfig::default();
        config.rate_limit.api.burst = 0;
        config.rate_limit.login.requests_per_second = -1.0;
        config.connections.max_per_ip = 0;
        config.trust.allowed_origins = vec!["*".into()];
        config.trust.trusted_proxy_cidrs = vec!["10.0.0.0/33".into()];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "rate_limit.api.burst",
                "rate_limit.login.requests_per_second",
                "connections.max_per_ip",
                "trust.allowed_origins",
                "trust.trusted_proxy_cidrs",
            ]
        );
    }

    #[test]
    fn bare_proxy_ip_is_accepted() {
        let mut config = ConsoleConfig::default();
        config.trust.trusted_proxy_cidrs = vec!["192.168.1.10".into(), "fd00::/8".into()];
        assert!(validate_config(&config).is_ok());
    }
}
