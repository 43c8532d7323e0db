//! Gateway error taxonomy.
//!
//! Every failure in the request pipeline resolves to exactly one variant, and
//! every variant maps to exactly one HTTP status. The `String` payloads carry
//! internal detail for the access log only; clients see [`GatewayError::public_message`].

use axum::http::StatusCode;
use thiserror::Error;

/// Errors surfaced by the proxied request pipeline.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No bearer credential on the inbound request.
    #[error("missing bearer credential")]
    MissingCredential,

    /// The identity service rejected the credential.
    #[error("identity service rejected credential with status {0}")]
    Unauthenticated(u16),

    /// The identity service could not be reached (or timed out).
    #[error("identity service unavailable: {0}")]
    IdentityServiceUnavailable(String),

    /// The identity service answered 2xx with something that is not a claims object.
    #[error("malformed identity response: {0}")]
    MalformedIdentityResponse(String),

    /// The shared token bucket is empty.
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// No registered route prefix matches the path.
    #[error("no route matches path {0}")]
    RouteNotFound(String),

    /// A route matched but does not allow the method.
    #[error("method {method} not allowed on route {route}")]
    MethodNotAllowed { route: String, method: String },

    /// Transport failure reaching the upstream (refused, DNS, timeout).
    #[error("upstream {route} unavailable: {detail}")]
    UpstreamUnavailable { route: String, detail: String },

    /// Anything else, including caught panics.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// HTTP status this error resolves to.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingCredential | GatewayError::Unauthenticated(_) => {
                StatusCode::UNAUTHORIZED
            }
            GatewayError::IdentityServiceUnavailable(_)
            | GatewayError::MalformedIdentityResponse(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Generic client-facing message. Never includes internal detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::MissingCredential => "Unauthorized: Missing token",
            GatewayError::Unauthenticated(_) => "Unauthorized",
            GatewayError::RateLimitExceeded => "Rate limit exceeded",
            GatewayError::RouteNotFound(_) => "Not Found",
            GatewayError::MethodNotAllowed { .. } => "Method Not Allowed",
            GatewayError::UpstreamUnavailable { .. } => "Service Unavailable",
            GatewayError::IdentityServiceUnavailable(_)
            | GatewayError::MalformedIdentityResponse(_)
            | GatewayError::Internal(_) => "Internal Server Error",
        }
    }

    /// Short stable name used as the `outcome` field in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::MissingCredential => "missing_credential",
            GatewayError::Unauthenticated(_) => "unauthenticated",
            GatewayError::IdentityServiceUnavailable(_) => "identity_service_unavailable",
            GatewayError::MalformedIdentityResponse(_) => "malformed_identity_response",
            GatewayError::RateLimitExceeded => "rate_limit_exceeded",
            GatewayError::RouteNotFound(_) => "route_not_found",
            GatewayError::MethodNotAllowed { .. } => "method_not_allowed",
            GatewayError::UpstreamUnavailable { .. } => "upstream_unavailable",
            GatewayError::Internal(_) => "internal_error",
        }
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, GatewayError>;
