//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, latency, cache effectiveness, connections)
//! - Expose Prometheus-compatible metrics endpoint when enabled
//!
//! # Metrics
//! - `proxy_requests_total` (counter): finished connections by outcome
//! - `proxy_request_duration_seconds` (histogram): connection latency
//! - `proxy_cache_lookups_total` (counter): by result (hit, miss)
//! - `proxy_cache_inserts_total` (counter): by result (stored, evicted, skipped)
//! - `proxy_bytes_relayed_total` (counter): bytes written to clients
//! - `proxy_active_connections` (gauge): current connection count
//!
//! # Design Decisions
//! - Facade macros are no-ops until a recorder is installed
//! - Labels stay low-cardinality (no URIs, no hosts)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::cache::InsertOutcome;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must run inside a Tokio runtime. Failure is logged and the proxy keeps going.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// One finished connection.
pub fn record_request(outcome: &'static str, started: Instant) {
    counter!("proxy_requests_total", "outcome" => outcome).increment(1);
    histogram!("proxy_request_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("proxy_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_insert(outcome: &InsertOutcome) {
    let result = match outcome {
        InsertOutcome::Stored { .. } => "stored",
        InsertOutcome::Evicted { .. } => "evicted",
        InsertOutcome::Skipped(_) => "skipped",
    };
    counter!("proxy_cache_inserts_total", "result" => result).increment(1);
}

pub fn record_bytes_relayed(bytes: usize) {
    counter!("proxy_bytes_relayed_total").increment(bytes as u64);
}

pub fn set_active_connections(count: u64) {
    gauge!("proxy_active_connections").set(count as f64);
}
