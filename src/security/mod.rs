//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming /api request:
//!     → rate_limit.rs (shared token bucket, admit or 429)
//!     → auth.rs (bearer credential → identity service → CallerIdentity)
//!     → headers.rs (identity + X-Forwarded-* for the upstream call)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Cheapest check first: no outbound call for rate-limited requests
//! - No trust in client input (identity/forwarding headers overwritten)

pub mod auth;
pub mod headers;
pub mod rate_limit;

pub use auth::{bearer_credential, AuthDelegate, CallerIdentity};
pub use rate_limit::{RateLimiter, TokenBucket, Unlimited};
