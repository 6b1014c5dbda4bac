//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check addresses parse and dispatcher keys are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Role specifications are checked by compiling them, not here

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: '{}'", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "listener.request_timeout_secs",
            "must be greater than zero",
        ));
    }

    let routing = &config.routing;
    if routing.action_key.is_empty() {
        errors.push(ValidationError::new("routing.action_key", "must not be empty"));
    }
    if routing.params_key.is_empty() {
        errors.push(ValidationError::new("routing.params_key", "must not be empty"));
    }
    if !routing.action_key.is_empty() && routing.action_key == routing.params_key {
        errors.push(ValidationError::new(
            "routing.params_key",
            "must differ from routing.action_key",
        ));
    }
    if routing.param_marker == '/' || routing.param_marker.is_whitespace() {
        errors.push(ValidationError::new(
            "routing.param_marker",
            format!("unusable marker '{}'", routing.param_marker),
        ));
    }

    if config.roles.keys().any(|name| name.trim().is_empty()) {
        errors.push(ValidationError::new("roles", "role names must not be blank"));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: '{}'", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
