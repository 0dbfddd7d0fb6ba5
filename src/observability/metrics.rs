//! Metrics collection and exposition.
//!
//! # Metrics
//! - `autoload_routes_registered_total` (counter): routes registered, by method
//! - `autoload_routes_skipped_total` (counter): files skipped, by reason
//! - `autoload_reloads_total` (counter): change events handled, by outcome
//! - `autoload_override_hits_total` (counter): requests served by a reloaded handler
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; nothing is exported until
//!   [`init_metrics`] installs the Prometheus recorder

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_route_registered(method: &str) {
    counter!("autoload_routes_registered_total", "method" => method.to_string()).increment(1);
}

pub fn record_route_skipped(reason: &'static str) {
    counter!("autoload_routes_skipped_total", "reason" => reason).increment(1);
}

pub fn record_reload(outcome: &'static str) {
    counter!("autoload_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_override_hit() {
    counter!("autoload_override_hits_total").increment(1);
}
