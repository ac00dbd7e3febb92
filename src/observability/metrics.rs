//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define trigger metrics (requests, latency, dispatch outcomes)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `trigger_requests_total` (counter): requests by trigger, method, status
//! - `trigger_request_duration_seconds` (histogram): latency distribution
//! - `trigger_dispatch_total` (counter): matched / default / unresolved
//! - `trigger_condition_errors_total` (counter): conditions skipped on error
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels for trigger, method, status code

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(trigger: &str, method: &str, status: u16, start: Instant) {
    counter!(
        "trigger_requests_total",
        "trigger" => trigger.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "trigger_request_duration_seconds",
        "trigger" => trigger.to_string(),
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_dispatch(trigger: &str, outcome: &'static str) {
    counter!(
        "trigger_dispatch_total",
        "trigger" => trigger.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_condition_error(trigger: &str) {
    counter!("trigger_condition_errors_total", "trigger" => trigger.to_string()).increment(1);
}
