//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::ConsoleConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<ConsoleConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ConsoleConfig::default(),
    };

    apply_env(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env<F>(config: &mut ConsoleConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = value;
    }
    if let Some(value) = lookup("ALLOWED_ORIGINS") {
        config.trust.allowed_origins = split_list(&value);
    }
    if let Some(value) = lookup("TRUSTED_PROXY_CIDRS") {
        config.trust.trusted_proxy_cidrs = split_list(&value);
    }
    if let Some(value) = lookup("APP_ENV") {
        config.trust.production = value.trim().eq_ignore_ascii_case("production");
    }
    if let Some(value) = lookup("PRODUCTION_MODE") {
        config.trust.production = parse_bool("PRODUCTION_MODE", &value)?;
    }
    if let Some(value) = lookup("MAX_WS_CONNECTIONS") {
        config.connections.max_per_ip = parse_var("MAX_WS_CONNECTIONS", &value)?;
    }
    if let Some(value) = lookup("API_RATE_LIMIT_RPS") {
        config.rate_limit.api.requests_per_second = parse_var("API_RATE_LIMIT_RPS", &value)?;
    }
    if let Some(value) = lookup("API_RATE_LIMIT_BURST") {
        config.rate_limit.api.burst = parse_var("API_RATE_LIMIT_BURST", &value)?;
    }
    if let Some(value) = lookup("LOGIN_RATE_LIMIT_RPS") {
        config.rate_limit.login.requests_per_second = parse_var("LOGIN_RATE_LIMIT_RPS", &value)?;
    }
    if let Some(value) = lookup("LOGIN_RATE_LIMIT_BURST") {
        config.rate_limit.login.burst = parse_var("LOGIN_RATE_LIMIT_BURST", &value)?;
    }
    Ok(())
}

/// Split a comma-separated list, dropping blanks.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_string(),
    })
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::Env {
            var,
            value: value.to_string(),
        }),
    }
}
