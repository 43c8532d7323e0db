//! Outbound header construction for proxied requests.
//!
//! # Responsibilities
//! - Copy inbound headers to the upstream request
//! - Set X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host
//! - Set the caller identity header from the authenticated subject
//!
//! # Design Decisions
//! - Forwarding headers are overwritten, never appended, so clients cannot
//!   inject their own chain
//! - A client-supplied identity header is always removed first
//! - `Host` is dropped; the upstream URI supplies the authority

use std::net::IpAddr;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::security::auth::CallerIdentity;

pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Client-side facts about the inbound request.
#[derive(Debug, Clone)]
pub struct ForwardedFor {
    pub client_ip: Option<IpAddr>,
    pub scheme: String,
    pub host: Option<HeaderValue>,
}

/// Build the header map sent upstream from the inbound headers.
pub fn outbound_headers(
    inbound: &HeaderMap,
    identity: &CallerIdentity,
    forwarded: &ForwardedFor,
) -> HeaderMap {
    let mut headers = inbound.clone();
    headers.remove(header::HOST);
    headers.remove(&X_USER_ID);

    if let Some(subject) = identity.subject.as_deref() {
        match HeaderValue::from_str(subject) {
            Ok(value) => {
                headers.insert(X_USER_ID, value);
            }
            Err(_) => tracing::warn!("Subject claim is not a valid header value; not forwarded"),
        }
    }

    match forwarded.client_ip {
        Some(ip) => {
            if let Ok(value) = HeaderValue::from_str(&ip.to_string()) {
                headers.insert(X_FORWARDED_FOR, value);
            }
        }
        None => {
            headers.remove(X_FORWARDED_FOR);
        }
    }

    if let Ok(value) = HeaderValue::from_str(&forwarded.scheme) {
        headers.insert(X_FORWARDED_PROTO, value);
    }

    match &forwarded.host {
        Some(host) => {
            headers.insert(X_FORWARDED_HOST, host.clone());
        }
        None => {
            headers.remove(X_FORWARDED_HOST);
        }
    }

    headers
}
