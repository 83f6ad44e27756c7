//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sizes > 0, addresses parse)
//! - Keep the wire caps consistent with each other
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// Smallest line cap that still fits a realistic request line.
pub const MIN_LINE_LENGTH: usize = 64;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check every semantic constraint, collecting all violations.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == Some(0) {
        errors.push(ValidationError::new(
            "listener.max_connections",
            "must be at least 1 when set",
        ));
    }

    let cache = &config.cache;
    if cache.slots == 0 {
        errors.push(ValidationError::new("cache.slots", "must be at least 1"));
    }
    if cache.max_object_size == 0 {
        errors.push(ValidationError::new("cache.max_object_size", "must be positive"));
    } else if cache.max_object_size > cache.max_cache_size {
        errors.push(ValidationError::new(
            "cache.max_object_size",
            format!(
                "{} exceeds cache.max_cache_size ({})",
                cache.max_object_size, cache.max_cache_size
            ),
        ));
    }

    let limits = &config.limits;
    if limits.max_line_length < MIN_LINE_LENGTH {
        errors.push(ValidationError::new(
            "limits.max_line_length",
            format!("must be at least {}", MIN_LINE_LENGTH),
        ));
    }
    if limits.max_header_bytes < limits.max_line_length {
        errors.push(ValidationError::new(
            "limits.max_header_bytes",
            "must be at least limits.max_line_length",
        ));
    }
    if limits.relay_chunk_size == 0 {
        errors.push(ValidationError::new("limits.relay_chunk_size", "must be positive"));
    }

    let agent = &config.origin.user_agent;
    if agent.trim().is_empty() {
        errors.push(ValidationError::new("origin.user_agent", "must not be empty"));
    } else if agent.contains(['\r', '\n']) {
        errors.push(ValidationError::new(
            "origin.user_agent",
            "must not contain line breaks",
        ));
    }

    if config.timeouts.connect_secs == Some(0) {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be positive when set"));
    }
    if config.timeouts.idle_secs == Some(0) {
        errors.push(ValidationError::new("timeouts.idle_secs", "must be positive when set"));
    }

    let obs = &config.observability;
    if !LOG_LEVELS.contains(&obs.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("`{}` is not one of {}", obs.log_level, LOG_LEVELS.join(", ")),
        ));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
