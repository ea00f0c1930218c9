//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, bound operations)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by pattern, operation, code
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_bound_operations` (gauge): operations that survived the build
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests and
//!   deployments without the endpoint pay nothing
//! - Labels carry the configured pattern and operation names, never ids;
//!   unmatched requests share a single placeholder so series stay bounded

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one answered request.
pub fn record_request(pattern: &str, operation: &str, code: i32, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "pattern" => pattern.to_string(),
        "operation" => operation.to_string(),
        "code" => code.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "gateway_request_duration_seconds",
        "pattern" => pattern.to_string(),
        "operation" => operation.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record how many operations the route table ended up with.
pub fn record_bound_operations(count: usize) {
    metrics::gauge!("gateway_bound_operations").set(count as f64);
}
