//! Response handling.
//!
//! # Responsibilities
//! - Map gateway errors to a status and a generic JSON body
//! - Carry per-request facts (route, caller, failure detail) from the
//!   handler to the access log via response extensions
//! - Convert caught panics into 500 responses
//!
//! # Design Decisions
//! - Clients only ever see the generic message; detail stays in the log
//! - Upstream responses are relayed as-is and never pass through here

use std::any::Any;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::GatewayError;

/// Failure detail recorded for the access log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub kind: &'static str,
    pub detail: String,
}

impl From<&GatewayError> for FailureRecord {
    fn from(err: &GatewayError) -> Self {
        Self {
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}

/// What the pipeline learned about a request, attached to its response.
#[derive(Debug, Clone, Default)]
pub struct RequestOutcome {
    /// Matched route name; `None` if the request never got that far.
    pub route: Option<String>,
    /// Authenticated subject.
    pub caller: Option<String>,
    pub failure: Option<FailureRecord>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}

/// Build the response for a panic caught inside the pipeline.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    let err = GatewayError::Internal(format!("handler panicked: {}", detail));
    let outcome = RequestOutcome {
        failure: Some(FailureRecord::from(&err)),
        ..Default::default()
    };

    let mut response = err.into_response();
    response.extensions_mut().insert(outcome);
    response
}
