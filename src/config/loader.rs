//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, API_ROUTE_NAME};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    let config = apply_env_overrides(config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `PORT`, `AUTH_SERVICE_URL` and `API_SERVICE_URL` overrides.
///
/// `lookup` abstracts the environment so the mapping can be tested without
/// touching process state.
pub fn apply_env_overrides<F>(mut config: GatewayConfig, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
        let port: u16 = port.parse().map_err(|_| ConfigError::Env {
            var: "PORT",
            value: port.clone(),
        })?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }

    if let Some(url) = lookup("AUTH_SERVICE_URL").filter(|v| !v.is_empty()) {
        config.identity.service_url = url;
    }

    if let Some(url) = lookup("API_SERVICE_URL").filter(|v| !v.is_empty()) {
        match config.routes.iter_mut().find(|r| r.name == API_ROUTE_NAME) {
            Some(route) => route.upstream_url = url,
            None => tracing::warn!(
                route = API_ROUTE_NAME,
                "API_SERVICE_URL set but no route with that name is configured"
            ),
        }
    }

    Ok(config)
}
