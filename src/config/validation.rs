//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, statuses in range)
//! - Check addresses parse before anything binds them
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// An address field does not parse as `host:port`.
    #[error("Invalid socket address for {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },

    /// `router.allowed_methods` was given but lists nothing.
    #[error("router.allowed_methods must not be empty")]
    EmptyAllowedMethods,

    /// `router.charset` is blank.
    #[error("router.charset must not be empty")]
    EmptyCharset,

    /// A message override uses a status outside 100..=599.
    #[error("Message {key} has invalid status {status}")]
    InvalidStatus { key: String, status: u16 },

    /// A numeric limit that must be positive is zero.
    #[error("{0} must be greater than 0")]
    ZeroValue(&'static str),
}

/// Check `config` and collect every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if matches!(&config.router.allowed_methods, Some(methods) if methods.is_empty()) {
        errors.push(ValidationError::EmptyAllowedMethods);
    }

    if config.router.charset.trim().is_empty() {
        errors.push(ValidationError::EmptyCharset);
    }

    for (key, message) in &config.messages {
        if !(100..=599).contains(&message.status) {
            errors.push(ValidationError::InvalidStatus {
                key: key.clone(),
                status: message.status,
            });
        }
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroValue("security.max_body_size"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
