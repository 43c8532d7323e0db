//! Bearer credential validation against the remote identity service.
//!
//! One outbound `POST {service_url}/validate` per inbound request, bounded by
//! a timeout. Results are never cached.

use std::time::Duration;

use axum::http::{header, HeaderMap};
use serde_json::{Map, Value};

use crate::config::IdentityConfig;
use crate::error::{GatewayError, Result};

/// Claim holding the caller's subject identifier.
pub const SUBJECT_CLAIM: &str = "sub";

/// Identity established for a single request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallerIdentity {
    /// `sub` claim when it is a string.
    pub subject: Option<String>,
    /// Full claims object, passed through untouched.
    pub claims: Map<String, Value>,
}

impl CallerIdentity {
    pub fn from_claims(claims: Map<String, Value>) -> Self {
        let subject = claims
            .get(SUBJECT_CLAIM)
            .and_then(Value::as_str)
            .map(str::to_owned);
        Self { subject, claims }
    }
}

/// Extract the bearer credential from `Authorization`, if any.
///
/// The scheme is case-insensitive; an empty token counts as missing.
pub fn bearer_credential(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Client for the identity service.
#[derive(Debug, Clone)]
pub struct AuthDelegate {
    client: reqwest::Client,
    validate_url: String,
    timeout: Duration,
}

impl AuthDelegate {
    pub fn new(service_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            validate_url: format!("{}/validate", service_url.trim_end_matches('/')),
            timeout,
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(&config.service_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn validate_url(&self) -> &str {
        &self.validate_url
    }

    /// Validate `credential` and return the caller's identity.
    ///
    /// Dropping the returned future aborts the outbound call.
    pub async fn authenticate(&self, credential: Option<&str>) -> Result<CallerIdentity> {
        let credential = credential.ok_or(GatewayError::MissingCredential)?;

        let response = self
            .client
            .post(&self.validate_url)
            .bearer_auth(credential)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(
                    url = %self.validate_url,
                    timed_out = e.is_timeout(),
                    error = %e,
                    "Identity service call failed"
                );
                let detail = if e.is_timeout() {
                    format!("timed out after {:?}: {}", self.timeout, e)
                } else {
                    e.to_string()
                };
                GatewayError::IdentityServiceUnavailable(detail)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Unauthenticated(status.as_u16()));
        }

        let claims: Map<String, Value> = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedIdentityResponse(e.to_string()))?;

        let identity = CallerIdentity::from_claims(claims);
        tracing::debug!(subject = ?identity.subject, "Credential validated");
        Ok(identity)
    }
}
