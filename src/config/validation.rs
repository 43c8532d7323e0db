//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, capacity > 0, address parses)
//! - Check route names are unique and prefixes live under `/api`
//! - Check every URL is a plain `http` base URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::Method;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
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

/// Validate a loaded configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    check_http_url(&mut errors, "identity.service_url", &config.identity.service_url);
    if config.identity.timeout_secs == 0 {
        errors.push(ValidationError::new("identity.timeout_secs", "must be greater than 0"));
    }

    if config.routes.is_empty() {
        errors.push(ValidationError::new("routes", "at least one route is required"));
    }

    let mut names = HashSet::new();
    for (i, route) in config.routes.iter().enumerate() {
        let field = |name: &str| format!("routes[{}].{}", i, name);

        if route.name.trim().is_empty() {
            errors.push(ValidationError::new(field("name"), "must not be empty"));
        } else if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::new(
                field("name"),
                format!("duplicate route name '{}'", route.name),
            ));
        }

        let prefix = route.path_prefix.as_str();
        let under_api = prefix == "/api" || prefix.starts_with("/api/");
        if !under_api {
            errors.push(ValidationError::new(
                field("path_prefix"),
                format!("'{}' must start with /api", prefix),
            ));
        } else if prefix.len() > 1 && prefix.ends_with('/') {
            errors.push(ValidationError::new(
                field("path_prefix"),
                format!("'{}' must not end with '/'", prefix),
            ));
        }

        check_http_url(&mut errors, &field("upstream_url"), &route.upstream_url);

        if route.methods.is_empty() {
            errors.push(ValidationError::new(field("methods"), "must not be empty"));
        }
        for method in &route.methods {
            if method.parse::<Method>().is_err() || method.is_empty() {
                errors.push(ValidationError::new(
                    field("methods"),
                    format!("'{}' is not an HTTP method", method),
                ));
            }
        }
    }

    let rl = &config.rate_limit;
    if rl.enabled {
        if rl.capacity == 0 {
            errors.push(ValidationError::new("rate_limit.capacity", "must be greater than 0"));
        }
        if rl.refill_tokens == 0 {
            errors.push(ValidationError::new("rate_limit.refill_tokens", "must be greater than 0"));
        }
        if rl.refill_interval_ms == 0 {
            errors.push(ValidationError::new(
                "rate_limit.refill_interval_ms",
                "must be greater than 0",
            ));
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::new("timeouts.upstream_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &str, raw: &str) {
    match Url::parse(raw) {
        Ok(url) if url.scheme() == "http" && url.host_str().is_some() => {
            if url.query().is_some() || url.fragment().is_some() {
                errors.push(ValidationError::new(field, "must not carry a query or fragment"));
            }
        }
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}', expected http", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", raw, e))),
    }
}
