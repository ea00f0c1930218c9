//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Wire field names must be non-empty and distinct within the request
//!   set and within the response set
//! - Patterns must be absolute paths, services and handlers must be named
//! - Module and command ids must fit in 16 bits
//! - Reserved response codes must be distinct
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashMap;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, RoutingConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("routing.{0} must not be empty")]
    EmptyFieldName(&'static str),

    #[error("routing.{first} and routing.{second} both use field name `{name}`")]
    DuplicateFieldName {
        first: &'static str,
        second: &'static str,
        name: String,
    },

    #[error("pattern `{0}` must start with `/`")]
    InvalidPattern(String),

    #[error("pattern `{0}` has no service")]
    EmptyService(String),

    #[error("operation `{operation}` on `{pattern}` has no handler")]
    EmptyHandler { pattern: String, operation: String },

    #[error("operation name on `{0}` must not be empty")]
    EmptyOperation(String),

    #[error("{0} patterns configured, at most 65535 fit in a module id")]
    TooManyRoutes(usize),

    #[error("pattern `{pattern}` has {count} operations, at most 65535 fit in a command id")]
    TooManyOperations { pattern: String, count: usize },

    #[error("response codes {first} and {second} share the value {code}")]
    DuplicateResponseCode {
        first: &'static str,
        second: &'static str,
        code: i32,
    },
}

/// Validate the whole process configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if let Err(routing_errors) = validate_routing(&config.routing) {
        errors.extend(routing_errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the routing table on its own.
pub fn validate_routing(routing: &RoutingConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Request and response fields never share a message, so names only
    // have to be distinct within each set.
    for fields in [routing.request_field_names(), routing.response_field_names()] {
        let mut seen_fields: HashMap<&str, &'static str> = HashMap::new();
        for (label, name) in fields {
            let error = if name.is_empty() {
                ValidationError::EmptyFieldName(label)
            } else if let Some(first) = seen_fields.insert(name, label) {
                ValidationError::DuplicateFieldName {
                    first,
                    second: label,
                    name: name.to_string(),
                }
            } else {
                continue;
            };
            if !errors.contains(&error) {
                errors.push(error);
            }
        }
    }

    let mut seen_codes: HashMap<i32, &'static str> = HashMap::new();
    for (label, code) in routing.codes.all() {
        if let Some(first) = seen_codes.insert(code, label) {
            errors.push(ValidationError::DuplicateResponseCode {
                first,
                second: label,
                code,
            });
        }
    }

    if routing.patterns.len() > usize::from(u16::MAX) {
        errors.push(ValidationError::TooManyRoutes(routing.patterns.len()));
    }

    for (pattern, route) in routing.patterns.iter() {
        if !pattern.starts_with('/') {
            errors.push(ValidationError::InvalidPattern(pattern.to_string()));
        }
        if route.service.trim().is_empty() {
            errors.push(ValidationError::EmptyService(pattern.to_string()));
        }
        if route.operations.len() > usize::from(u16::MAX) {
            errors.push(ValidationError::TooManyOperations {
                pattern: pattern.to_string(),
                count: route.operations.len(),
            });
        }
        for (name, operation) in route.operations.iter() {
            if name.is_empty() {
                errors.push(ValidationError::EmptyOperation(pattern.to_string()));
            }
            if operation.handler.trim().is_empty() {
                errors.push(ValidationError::EmptyHandler {
                    pattern: pattern.to_string(),
                    operation: name.to_string(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
