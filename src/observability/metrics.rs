//! Metrics collection and exposition.
//!
//! # Metrics
//! - `quotation_requests_total` (counter): requests by outcome
//! - `quotation_request_duration_seconds` (histogram): end-to-end latency by outcome
//! - `quotation_stage_duration_seconds` (histogram): per-stage latency by stage, result
//! - `quotation_internal_errors_total` (counter): fail-loud errors by stage
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_outcome(outcome: &'static str, started: Instant) {
    counter!("quotation_requests_total", "outcome" => outcome).increment(1);
    histogram!("quotation_request_duration_seconds", "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}

/// Record one pipeline stage.
pub fn record_stage(stage: &'static str, result: &'static str, started: Instant) {
    histogram!("quotation_stage_duration_seconds", "stage" => stage, "result" => result)
        .record(started.elapsed().as_secs_f64());
}

/// Count an error that must reach an operator.
pub fn record_internal_error(stage: &'static str) {
    counter!("quotation_internal_errors_total", "stage" => stage).increment(1);
}
