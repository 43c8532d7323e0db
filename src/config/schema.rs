//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the API gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Identity service used to validate bearer credentials.
    pub identity: IdentityConfig,

    /// Route definitions mapping path prefixes to upstream services.
    pub routes: Vec<RouteConfig>,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            identity: IdentityConfig::default(),
            routes: default_routes(),
            rate_limit: RateLimitConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
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

/// Identity service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Base URL; credentials are posted to `{service_url}/validate`.
    pub service_url: String,

    /// Deadline for a single validation call in seconds.
    pub timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            service_url: "http://auth-service:8080".to_string(),
            timeout_secs: 5,
        }
    }
}

/// Route configuration mapping a path prefix to an upstream service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Path prefix to match (e.g. "/api/v1/configs").
    pub path_prefix: String,

    /// Upstream base URL the suffix path is appended to.
    pub upstream_url: String,

    /// Methods accepted on this route.
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
}

impl RouteConfig {
    pub fn new(
        name: impl Into<String>,
        path_prefix: impl Into<String>,
        upstream_url: impl Into<String>,
        methods: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            path_prefix: path_prefix.into(),
            upstream_url: upstream_url.into(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }
}

fn default_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "DELETE"].iter().map(|m| m.to_string()).collect()
}

/// Name of the route retargeted by `API_SERVICE_URL`.
pub const API_ROUTE_NAME: &str = "api";

fn default_routes() -> Vec<RouteConfig> {
    const CRUD: &[&str] = &["GET", "POST", "PUT", "DELETE"];
    vec![
        RouteConfig::new(API_ROUTE_NAME, "/api/v1", "http://api-service:8080", CRUD),
        RouteConfig::new(
            "deployments",
            "/api/v1/deployments",
            "http://deployment-service:8080",
            CRUD,
        ),
        RouteConfig::new(
            "monitoring",
            "/api/v1/monitoring",
            "http://monitoring-service:8080",
            &["GET"],
        ),
        RouteConfig::new(
            "configs",
            "/api/v1/configs",
            "http://configuration-service:8080",
            CRUD,
        ),
    ]
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Upstream call timeout (until response headers arrive) in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
        }
    }
}

/// Rate limiting configuration.
///
/// One process-wide token bucket: `capacity` tokens at most, refilled
/// continuously at `refill_tokens` per `refill_interval_ms`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Bucket capacity (burst size).
    pub capacity: u32,

    /// Tokens added per refill interval.
    pub refill_tokens: u32,

    /// Refill interval in milliseconds.
    pub refill_interval_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 100,
            refill_tokens: 1,
            refill_interval_ms: 1000,
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
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
