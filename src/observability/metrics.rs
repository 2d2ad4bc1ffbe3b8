//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tracker_connections_accepted_total` (counter)
//! - `tracker_connections_closed_total` (counter): by close reason
//! - `tracker_accept_errors_total` (counter)
//! - `tracker_bytes_received_total` (counter)
//! - `tracker_active_connections` (gauge): current connection set size

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::net::CloseReason;

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_accepted(active: usize) {
    metrics::counter!("tracker_connections_accepted_total").increment(1);
    metrics::gauge!("tracker_active_connections").set(active as f64);
}

pub fn record_closed(reason: CloseReason, active: usize) {
    metrics::counter!("tracker_connections_closed_total", "reason" => reason.as_str()).increment(1);
    metrics::gauge!("tracker_active_connections").set(active as f64);
}

pub fn record_accept_error() {
    metrics::counter!("tracker_accept_errors_total").increment(1);
}

pub fn record_bytes_received(bytes: usize) {
    metrics::counter!("tracker_bytes_received_total").increment(bytes as u64);
}
