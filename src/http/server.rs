//! Gateway server setup and request pipeline.
//!
//! # Responsibilities
//! - Create Axum Router with health, metrics and proxied routes
//! - Wire up middleware (tracing, request ID, access log, panic catching)
//! - Run each proxied request through rate limit → auth → route → forward
//! - Bind server to listener and shut down gracefully
//!
//! # Pipeline
//! ```text
//! Received → RateLimitChecked → Authenticated → Routed → Forwarded → Completed
//!     │              │                │             │          │
//!     └─ 429         └─ 401/500       └─ 404/405    └─ 503     └─ upstream status
//! ```
//! Each terminal state returns through the access log exactly once.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use metrics_exporter_prometheus::BuildError;
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::http::middleware::access_log_middleware;
use crate::http::proxy::ProxyDispatcher;
use crate::http::request::{MakeRequestUuidV4, X_REQUEST_ID};
use crate::http::response::{panic_response, FailureRecord, RequestOutcome};
use crate::observability::MetricsRecorder;
use crate::routing::RouteTable;
use crate::security::auth::{bearer_credential, AuthDelegate};
use crate::security::rate_limit::{RateLimiter, TokenBucket, Unlimited};

/// Errors building the server.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build metrics recorder: {0}")]
    Metrics(#[from] BuildError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub limiter: Arc<dyn RateLimiter>,
    pub auth: AuthDelegate,
    pub dispatcher: ProxyDispatcher,
    pub metrics: Arc<MetricsRecorder>,
}

/// The API gateway.
pub struct GatewayServer {
    router: Router,
    state: AppState,
}

impl GatewayServer {
    /// Create a gateway with the token bucket described by `config`.
    pub fn new(config: GatewayConfig) -> std::result::Result<Self, StartupError> {
        let limiter: Arc<dyn RateLimiter> = if config.rate_limit.enabled {
            Arc::new(TokenBucket::from_config(&config.rate_limit))
        } else {
            Arc::new(Unlimited)
        };
        Self::with_rate_limiter(config, limiter)
    }

    /// Create a gateway with an explicit admission policy.
    pub fn with_rate_limiter(
        config: GatewayConfig,
        limiter: Arc<dyn RateLimiter>,
    ) -> std::result::Result<Self, StartupError> {
        let routes = RouteTable::from_config(&config.routes);
        for route in routes.routes() {
            tracing::info!(
                name = %route.name(),
                path = %route.path_prefix(),
                upstream = %route.upstream_base(),
                methods = ?route.methods(),
                "Registering route"
            );
        }

        let state = AppState {
            routes: Arc::new(routes),
            limiter,
            auth: AuthDelegate::from_config(&config.identity),
            dispatcher: ProxyDispatcher::from_config(&config.timeouts),
            metrics: Arc::new(MetricsRecorder::new()?),
        };

        let router = Self::build_router(state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let api = Router::new()
            .route("/api", any(proxy_handler))
            .route("/api/{*path}", any(proxy_handler))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                access_log_middleware,
            ))
            .with_state(state.clone());

        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(state)
            .merge(api)
            .fallback(fallback_handler)
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> std::result::Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.state.routes.len(),
            "API gateway starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("API gateway stopped");
        Ok(())
    }

    /// The router, for driving the gateway without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.state.metrics.clone()
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.snapshot(),
    )
}

async fn fallback_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
}

/// Entry point for every `/api` request.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let mut outcome = RequestOutcome::default();

    let mut response = match run_pipeline(&state, request, &mut outcome).await {
        Ok(response) => response,
        Err(err) => {
            outcome.failure = Some(FailureRecord::from(&err));
            err.into_response()
        }
    };

    response.extensions_mut().insert(outcome);
    response
}

/// Rate limit, authenticate, route, forward. Stops at the first failure.
async fn run_pipeline(
    state: &AppState,
    request: Request<Body>,
    outcome: &mut RequestOutcome,
) -> Result<Response> {
    if !state.limiter.admit() {
        return Err(GatewayError::RateLimitExceeded);
    }

    let identity = state
        .auth
        .authenticate(bearer_credential(request.headers()))
        .await?;
    outcome.caller = identity.subject.clone();

    let path = request.uri().path().to_string();
    let matched = state
        .routes
        .match_path(&path)
        .ok_or_else(|| GatewayError::RouteNotFound(path.clone()))?;
    let route = matched.route;
    outcome.route = Some(route.name().to_string());

    if !route.allows(request.method()) {
        return Err(GatewayError::MethodNotAllowed {
            route: route.name().to_string(),
            method: request.method().to_string(),
        });
    }

    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    state
        .dispatcher
        .dispatch(request, route, matched.suffix, &identity, client_addr)
        .await
}
