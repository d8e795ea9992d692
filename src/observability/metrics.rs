//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gated_requests_total` (counter): requests by status
//! - `gated_request_duration_seconds` (histogram): latency, including time blocked on the gate
//! - `gated_in_flight_requests` (gauge): requests currently being handled
//! - `gated_handler_faults_total` (counter): faults caught at the request boundary
//! - `gated_ready` (gauge): 0 while initializing, 1 once the gate opens
//! - `gated_shutdowns_total` (counter): drains by outcome
//! - `gated_respawns_total` (counter): re-exec attempts by result
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, start: Instant) {
    counter!("gated_requests_total", "status" => status.to_string()).increment(1);
    histogram!("gated_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_fault() {
    counter!("gated_handler_faults_total").increment(1);
}

pub fn set_in_flight(count: u64) {
    gauge!("gated_in_flight_requests").set(count as f64);
}

pub fn set_ready(ready: bool) {
    gauge!("gated_ready").set(if ready { 1.0 } else { 0.0 });
}

pub fn record_shutdown(outcome: &'static str) {
    counter!("gated_shutdowns_total", "outcome" => outcome).increment(1);
}

pub fn record_respawn(result: &'static str) {
    counter!("gated_respawns_total", "result" => result).increment(1);
}
