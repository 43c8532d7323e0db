//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the upstream URI from the route base, suffix path and query
//! - Forward method, headers and body (streamed) to the upstream
//! - Relay status, headers and body (streamed) back unchanged
//!
//! # Design Decisions
//! - One pooled client per gateway; connections are reused across requests
//! - One deadline per call covers connect, response headers and the relayed
//!   body; a body still streaming at the deadline is cut off with an error
//! - Dropping the dispatch future (client went away) drops the upstream call
//! - No retries: a transport failure is a 503 for this request

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, uri::InvalidUri, Request, Uri},
    response::Response,
    BoxError,
};
use hyper::body::{Body as HttpBody, Frame, Incoming, SizeHint};
use thiserror::Error;
use tokio::time::{Instant, Sleep};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;
use crate::error::{GatewayError, Result};
use crate::routing::Route;
use crate::security::auth::CallerIdentity;
use crate::security::headers::{outbound_headers, ForwardedFor};

/// `{upstream_base}{suffix}` plus the inbound query, untouched.
pub fn target_uri(upstream_base: &str, suffix: &str, query: Option<&str>) -> std::result::Result<Uri, InvalidUri> {
    let mut target = String::with_capacity(upstream_base.len() + suffix.len() + 1);
    target.push_str(upstream_base);
    target.push_str(suffix);
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }
    target.parse()
}

/// The upstream body was still streaming when the call deadline passed.
#[derive(Debug, Error)]
#[error("upstream body not complete within {0:?}")]
pub struct BodyDeadlineElapsed(pub Duration);

/// Relays an upstream body until a fixed deadline, then fails the stream.
pub struct DeadlineBody<B> {
    inner: B,
    deadline: Pin<Box<Sleep>>,
    budget: Duration,
}

impl<B> DeadlineBody<B> {
    pub fn new(inner: B, deadline: Instant, budget: Duration) -> Self {
        Self {
            inner,
            deadline: Box::pin(tokio::time::sleep_until(deadline)),
            budget,
        }
    }
}

impl<B> HttpBody for DeadlineBody<B>
where
    B: HttpBody + Unpin,
    B::Error: Into<BoxError>,
{
    type Data = B::Data;
    type Error = BoxError;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<std::result::Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        if let Poll::Ready(frame) = Pin::new(&mut this.inner).poll_frame(cx) {
            return Poll::Ready(frame.map(|result| result.map_err(Into::into)));
        }
        match this.deadline.as_mut().poll(cx) {
            Poll::Ready(()) => Poll::Ready(Some(Err(BodyDeadlineElapsed(this.budget).into()))),
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Forwards admitted, authenticated requests to their upstream.
#[derive(Clone)]
pub struct ProxyDispatcher {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl ProxyDispatcher {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client, timeout }
    }

    pub fn from_config(config: &TimeoutConfig) -> Self {
        Self::new(
            Duration::from_secs(config.connect_secs),
            Duration::from_secs(config.upstream_secs),
        )
    }

    /// Forward `request` to `route` and relay the upstream response.
    pub async fn dispatch(
        &self,
        request: Request<Body>,
        route: &Route,
        suffix: &str,
        identity: &CallerIdentity,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response> {
        let (parts, body) = request.into_parts();

        let uri = target_uri(route.upstream_base(), suffix, parts.uri.query())
            .map_err(|e| GatewayError::Internal(format!("invalid upstream URI for {}: {}", route.name(), e)))?;

        let forwarded = ForwardedFor {
            client_ip: client_addr.map(|addr| addr.ip()),
            scheme: parts.uri.scheme_str().unwrap_or("http").to_string(),
            host: parts.headers.get(header::HOST).cloned(),
        };

        let mut outbound = Request::builder()
            .method(parts.method.clone())
            .uri(uri.clone())
            .body(body)
            .map_err(|e| GatewayError::Internal(format!("failed to build upstream request: {}", e)))?;
        *outbound.headers_mut() = outbound_headers(&parts.headers, identity, &forwarded);

        tracing::debug!(route = %route.name(), target = %uri, method = %parts.method, "Forwarding request");

        let deadline = Instant::now() + self.timeout;
        let response: hyper::Response<Incoming> =
            match tokio::time::timeout_at(deadline, self.client.request(outbound)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    return Err(GatewayError::UpstreamUnavailable {
                        route: route.name().to_string(),
                        detail: format!("{} ({:?})", uri, e),
                    });
                }
                Err(_) => {
                    return Err(GatewayError::UpstreamUnavailable {
                        route: route.name().to_string(),
                        detail: format!("{} timed out after {:?}", uri, self.timeout),
                    });
                }
            };

        let (parts, body) = response.into_parts();
        let body = DeadlineBody::new(body, deadline, self.timeout);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

impl std::fmt::Debug for ProxyDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyDispatcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};

    #[test]
    fn test_target_uri() {
        let uri = target_uri("http://configuration-service:8080", "/foo", Some("x=1")).unwrap();
        assert_eq!(uri.to_string(), "http://configuration-service:8080/foo?x=1");

        let uri = target_uri("http://svc:8080/base", "/", None).unwrap();
        assert_eq!(uri.to_string(), "http://svc:8080/base/");
    }

    #[test]
    fn test_target_uri_keeps_query_verbatim() {
        let uri = target_uri("http://svc", "/search", Some("q=a%20b&tag=x&tag=y")).unwrap();
        assert_eq!(uri.query(), Some("q=a%20b&tag=x&tag=y"));
    }

    #[tokio::test]
    async fn test_refused_connection_is_upstream_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let route = Route::new("configs", "/api/v1/configs", &format!("http://{}", addr), [Method::GET]);
        let dispatcher = ProxyDispatcher::new(Duration::from_secs(1), Duration::from_secs(2));
        let request = Request::builder()
            .uri("/api/v1/configs/foo")
            .body(Body::empty())
            .unwrap();

        let err = dispatcher
            .dispatch(request, &route, "/foo", &CallerIdentity::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(matches!(err, GatewayError::UpstreamUnavailable { ref route, .. } if route == "configs"));
    }
}
