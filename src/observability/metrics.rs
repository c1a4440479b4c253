//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define faucet metrics (claims, transfers, queue depth, nonce resyncs)
//! - Expose Prometheus-compatible metrics endpoint
//! - Track per-sender and aggregate metrics
//!
//! # Metrics
//! - `faucet_claims_total` (counter): claims by outcome
//! - `faucet_rate_limited_total` (counter): denials by key kind (address, origin)
//! - `faucet_transfers_total` (counter): transfers by sender and result
//! - `faucet_transfer_duration_seconds` (histogram): submission latency
//! - `faucet_queue_depth` (gauge): claims waiting for the dispatch gate
//! - `faucet_nonce_resyncs_total` (counter): resyncs by sender and result
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op, so tests need no setup
//! - Sender addresses are the only high-cardinality label and are bounded by key count

use alloy::primitives::Address;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_claim(outcome: &'static str) {
    metrics::counter!("faucet_claims_total", "outcome" => outcome).increment(1);
}

pub fn record_rate_limited(key_kind: &'static str) {
    metrics::counter!("faucet_rate_limited_total", "key" => key_kind).increment(1);
}

pub fn record_transfer(sender: &Address, success: bool, started: Instant) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("faucet_transfers_total", "sender" => sender.to_string(), "result" => result).increment(1);
    metrics::histogram!("faucet_transfer_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_queue_depth(depth: usize) {
    metrics::gauge!("faucet_queue_depth").set(depth as f64);
}

pub fn record_nonce_resync(sender: &Address, success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("faucet_nonce_resyncs_total", "sender" => sender.to_string(), "result" => result).increment(1);
}
