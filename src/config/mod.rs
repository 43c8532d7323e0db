//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, apply env overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → consumed once at startup to build the gateway
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; routes never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    GatewayConfig, IdentityConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RateLimitConfig, RouteConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
