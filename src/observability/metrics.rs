//! Metrics collection and exposition.
//!
//! # Metrics
//! - `harness_submissions_total` (counter): submissions by outcome
//! - `harness_confirmation_seconds` (histogram): submit-to-commitment latency by commitment
//! - `harness_rpc_errors_total` (counter): failed RPC calls by method

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_submission(outcome: &'static str) {
    metrics::counter!("harness_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_confirmation_latency(commitment: &'static str, elapsed: Duration) {
    metrics::histogram!("harness_confirmation_seconds", "commitment" => commitment)
        .record(elapsed.as_secs_f64());
}

pub fn record_rpc_error(method: &str) {
    metrics::counter!("harness_rpc_errors_total", "method" => method.to_string()).increment(1);
}
