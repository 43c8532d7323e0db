//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Count requests by route, method and status
//! - Record latency per route and method
//! - Render a Prometheus text snapshot for `/metrics`
//!
//! # Metrics
//! - `gateway_requests_total` (counter): labels `route`, `method`, `status`
//! - `gateway_request_duration_seconds` (histogram): labels `route`, `method`
//!
//! # Design Decisions
//! - The Prometheus recorder is owned, not installed globally, so each
//!   gateway instance has its own registry
//! - Updates are atomic inside the exporter; no extra locking here
//! - Buckets match the Prometheus client defaults

use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

pub const REQUESTS_TOTAL: &str = "gateway_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "gateway_request_duration_seconds";

/// Route label used when no route was resolved.
pub const UNKNOWN_ROUTE: &str = "unknown";

const DEFAULT_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Per-gateway metrics registry.
pub struct MetricsRecorder {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION_SECONDS.to_string()), DEFAULT_BUCKETS)?
            .build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            metrics::describe_counter!(
                REQUESTS_TOTAL,
                "Total number of requests processed by the API Gateway"
            );
            metrics::describe_histogram!(
                REQUEST_DURATION_SECONDS,
                metrics::Unit::Seconds,
                "Request duration in seconds"
            );
        });

        Ok(Self { recorder, handle })
    }

    /// Record one finished request.
    pub fn observe(&self, route: Option<&str>, method: &str, status: u16, duration: Duration) {
        let route = route.unwrap_or(UNKNOWN_ROUTE).to_string();
        let method = method.to_string();

        metrics::with_local_recorder(&self.recorder, || {
            metrics::counter!(
                REQUESTS_TOTAL,
                "route" => route.clone(),
                "method" => method.clone(),
                "status" => status.to_string()
            )
            .increment(1);
            metrics::histogram!(
                REQUEST_DURATION_SECONDS,
                "route" => route,
                "method" => method
            )
            .record(duration.as_secs_f64());
        });
    }

    /// Prometheus text exposition of the current state.
    pub fn snapshot(&self) -> String {
        self.handle.render()
    }
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRecorder").finish_non_exhaustive()
    }
}
