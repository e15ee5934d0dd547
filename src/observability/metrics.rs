//! Metrics collection and exposition.
//!
//! # Metrics
//! - `chain_operations_total` (counter): by operation, outcome
//! - `chain_operation_duration_seconds` (histogram): by operation
//! - `chain_rpc_healthy` (gauge): 1=healthy, 0=unhealthy
//! - `persistence_warnings_total` (counter): mirror writes that failed after chain success
//! - `http_requests_total` (counter): by route, status
//! - `rate_limited_total` (counter): requests refused by the per-client limiter

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::blockchain::types::ChainResult;

/// Start the Prometheus scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_chain_operation<T>(operation: &'static str, outcome: &ChainResult<T>, started: Instant) {
    let label = match outcome {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    counter!("chain_operations_total", "operation" => operation, "outcome" => label).increment(1);
    histogram!("chain_operation_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_chain_health(healthy: bool) {
    gauge!("chain_rpc_healthy").set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_persistence_warning(collection: &'static str) {
    counter!("persistence_warnings_total", "collection" => collection).increment(1);
}

pub fn record_http_request(route: &'static str, status: u16) {
    counter!("http_requests_total", "route" => route, "status" => status.to_string()).increment(1);
}

pub fn record_rate_limited() {
    counter!("rate_limited_total").increment(1);
}
