//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → /health, /metrics answered directly
//!     → /api/*: middleware/access_log.rs (timer, log line, metrics)
//!         → server.rs pipeline (rate limit, auth, route)
//!         → proxy.rs (forward upstream, stream response back)
//!         → response.rs (errors → status + generic body)
//! ```

pub mod middleware;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use proxy::ProxyDispatcher;
pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::RequestOutcome;
pub use server::{AppState, GatewayServer, StartupError};
