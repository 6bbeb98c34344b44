//! Metrics collection and exposition.
//!
//! # Metrics
//! - `console_requests_total` (counter): requests by method, status
//! - `console_rate_limited_total` (counter): denials by pool
//! - `console_origin_rejected_total` (counter): CSRF denials by reason
//! - `console_ws_rejected_total` (counter): refused WebSocket upgrades
//! - `console_ws_connections_active` (gauge): open WebSocket connections
//! - `console_rate_limiter_entries` (gauge): tracked client IPs by pool
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   exporter every call is a no-op
//! - Labels are low-cardinality (never client IPs or usernames)

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16) {
    counter!(
        "console_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_rate_limited(pool: &'static str) {
    counter!("console_rate_limited_total", "pool" => pool).increment(1);
}

pub fn record_origin_rejected(reason: &'static str) {
    counter!("console_origin_rejected_total", "reason" => reason).increment(1);
}

pub fn record_ws_rejected() {
    counter!("console_ws_rejected_total").increment(1);
}

pub fn record_ws_connection_opened() {
    gauge!("console_ws_connections_active").increment(1.0);
}

pub fn record_ws_connection_closed() {
    gauge!("console_ws_connections_active").decrement(1.0);
}

pub fn record_limiter_entries(pool: &'static str, entries: usize) {
    gauge!("console_rate_limiter_entries", "pool" => pool).set(entries as f64);
}
