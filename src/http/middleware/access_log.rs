//! Access log + metrics middleware for proxied routes.
//!
//! Wraps the whole `/api` pipeline, panic handler included, so every request
//! yields exactly one log line and one metrics observation whichever way it
//! ends.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::request::request_id;
use crate::http::response::RequestOutcome;
use crate::http::server::AppState;

/// Log target for access lines, filterable on its own.
pub const ACCESS_TARGET: &str = "api_gateway::access";

pub async fn access_log_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request_id(request.headers()).to_string();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    let outcome = response
        .extensions()
        .get::<RequestOutcome>()
        .cloned()
        .unwrap_or_default();

    state
        .metrics
        .observe(outcome.route.as_deref(), method.as_str(), status, elapsed);

    let route = outcome.route.as_deref().unwrap_or("-");
    let caller = outcome.caller.as_deref().unwrap_or("-");
    let latency_ms = elapsed.as_secs_f64() * 1000.0;

    let failure_kind = outcome.failure.as_ref().map(|f| f.kind);
    let failure_detail = outcome.failure.as_ref().map(|f| f.detail.as_str());

    macro_rules! emit {
        ($level:ident) => {
            tracing::$level!(
                target: ACCESS_TARGET,
                request_id = %request_id,
                method = %method,
                path = %path,
                status,
                latency_ms,
                remote_addr = %remote_addr,
                route,
                caller,
                outcome = failure_kind,
                error = failure_detail,
                "API Request"
            )
        };
    }

    match status {
        500.. => emit!(error),
        400..=499 => emit!(warn),
        _ => emit!(info),
    }

    response
}
