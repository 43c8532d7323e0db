//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming path
//!     → table.rs (route lookup)
//!     → matcher.rs (evaluate prefix, compute suffix)
//!     → Return: matched Route + suffix path, or NoMatch
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → route.rs (parse methods, normalize prefix and upstream)
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod route;
pub mod table;

pub use route::Route;
pub use table::{RouteMatch, RouteTable};
