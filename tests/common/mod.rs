//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_gateway::config::{GatewayConfig, RouteConfig};
use api_gateway::observability::MetricsRecorder;
use api_gateway::{GatewayServer, Shutdown};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const GOOD_TOKEN: &str = "good-token";
pub const NO_SUBJECT_TOKEN: &str = "no-subject";
pub const GARBAGE_TOKEN: &str = "garbage";
/// Answered only after `SLOW_IDENTITY_DELAY`.
pub const SLOW_TOKEN: &str = "slow";
pub const SLOW_IDENTITY_DELAY: Duration = Duration::from_secs(3);
pub const SUBJECT: &str = "user-42";

/// Size of the body served from `/large`.
pub const LARGE_BODY_LEN: usize = 4 * 1024 * 1024;

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// An address nothing listens on.
pub fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

pub struct MockIdentity {
    pub addr: SocketAddr,
    pub calls: Arc<AtomicUsize>,
}

impl MockIdentity {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

async fn validate(State(calls): State<Arc<AtomicUsize>>, headers: HeaderMap) -> Response {
    calls.fetch_add(1, Ordering::SeqCst);

    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match auth.strip_prefix("Bearer ") {
        Some(GOOD_TOKEN) => Json(json!({ "sub": SUBJECT, "role": "admin" })).into_response(),
        Some(NO_SUBJECT_TOKEN) => Json(json!({ "role": "guest" })).into_response(),
        Some(GARBAGE_TOKEN) => (StatusCode::OK, "definitely not json").into_response(),
        Some(SLOW_TOKEN) => {
            tokio::time::sleep(SLOW_IDENTITY_DELAY).await;
            Json(json!({ "sub": SUBJECT })).into_response()
        }
        _ => (StatusCode::UNAUTHORIZED, "invalid token").into_response(),
    }
}

/// Identity service answering `POST /validate`.
pub async fn start_identity_service() -> MockIdentity {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/validate", post(validate))
        .with_state(calls.clone());
    let addr = serve(router).await;
    MockIdentity { addr, calls }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct MockUpstream {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last(&self) -> RecordedRequest {
        self.requests.lock().unwrap().last().cloned().expect("no upstream request recorded")
    }
}

async fn record(
    State(requests): State<Arc<Mutex<Vec<RecordedRequest>>>>,
    request: Request<Body>,
) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    let uri = parts.uri.to_string();

    requests.lock().unwrap().push(RecordedRequest {
        method: parts.method.to_string(),
        uri: uri.clone(),
        headers: parts.headers,
        body,
    });

    match parts.uri.path() {
        "/slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            (StatusCode::OK, "too late").into_response()
        }
        "/large" => (StatusCode::OK, vec![b'x'; LARGE_BODY_LEN]).into_response(),
        _ => (
            StatusCode::ACCEPTED,
            [("x-upstream-id", "7")],
            format!("echo {} {}", parts.method, uri),
        )
            .into_response(),
    }
}

/// Upstream that records every request and echoes method + URI.
pub async fn start_upstream() -> MockUpstream {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new().fallback(record).with_state(requests.clone());
    let addr = serve(router).await;
    MockUpstream { addr, requests }
}

/// Upstream that sends headers and the first bytes of a 100-byte body, then
/// goes quiet while holding the connection open.
pub async fn start_stalling_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\nfirst")
                    .await;
                tokio::time::sleep(Duration::from_secs(60)).await;
                drop(socket);
            });
        }
    });
    addr
}

/// Upstream whose handler never finishes; flags record when it starts and
/// when its future is dropped.
pub struct HangingUpstream {
    pub addr: SocketAddr,
    pub entered: Arc<AtomicBool>,
    pub dropped: Arc<AtomicBool>,
}

impl HangingUpstream {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

struct SetOnDrop(Arc<AtomicBool>);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

pub async fn start_hanging_upstream() -> HangingUpstream {
    let entered = Arc::new(AtomicBool::new(false));
    let dropped = Arc::new(AtomicBool::new(false));

    let (on_enter, on_drop) = (entered.clone(), dropped.clone());
    let router = Router::new().fallback(move || {
        let (on_enter, on_drop) = (on_enter.clone(), on_drop.clone());
        async move {
            let _guard = SetOnDrop(on_drop);
            on_enter.store(true, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(60)).await;
            StatusCode::OK
        }
    });
    let addr = serve(router).await;
    HangingUpstream { addr, entered, dropped }
}

/// Poll `flag` until it is set or `within` elapses.
pub async fn wait_for(flag: &AtomicBool, within: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < within {
        if flag.load(Ordering::SeqCst) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    flag.load(Ordering::SeqCst)
}

/// Gateway config with `/api/v1` on `api_url`, `/api/v1/configs` on
/// `configs_url` and a GET-only `/api/v1/monitoring`.
pub fn gateway_config(identity_url: &str, api_url: &str, configs_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.identity.service_url = identity_url.to_string();
    config.routes = vec![
        RouteConfig::new("api", "/api/v1", api_url, &["GET", "POST", "PUT", "DELETE"]),
        RouteConfig::new("configs", "/api/v1/configs", configs_url, &["GET", "POST", "PUT", "DELETE"]),
        RouteConfig::new("monitoring", "/api/v1/monitoring", api_url, &["GET"]),
    ];
    config
}

pub struct RunningGateway {
    pub addr: SocketAddr,
    pub metrics: Arc<MetricsRecorder>,
    pub shutdown: Shutdown,
}

impl RunningGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> RunningGateway {
    let server = GatewayServer::new(config).unwrap();
    let metrics = server.metrics();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    RunningGateway { addr, metrics, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
