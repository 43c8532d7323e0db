//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every /api request:
//!     → http/middleware/access_log.rs (one access log line)
//!     → metrics.rs (counter + histogram)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (/metrics, Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through logs and to upstreams
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

pub use metrics::MetricsRecorder;
