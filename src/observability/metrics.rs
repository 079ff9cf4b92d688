//! Metrics collection and exposition.
//!
//! # Metrics
//! - `company_endpoint_requests_total` (counter): calls by method, outcome
//! - `company_endpoint_duration_seconds` (histogram): latency by method
//! - `company_rpc_active_connections` (gauge): open RPC connections
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup
//! - The Prometheus exporter runs as a run-group actor

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;
use thiserror::Error;

use crate::company::Method;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to build prometheus exporter: {0}")]
    Build(String),

    #[error("failed to install metrics recorder: {0}")]
    Install(String),
}

/// Build the Prometheus exporter on `addr` and install its recorder
/// globally. The returned future serves scrapes until dropped.
pub fn install_exporter(
    addr: SocketAddr,
) -> Result<impl Future<Output = Result<(), String>> + Send + 'static, MetricsError> {
    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .build()
        .map_err(|e| MetricsError::Build(e.to_string()))?;

    metrics::set_global_recorder(recorder).map_err(|e| MetricsError::Install(e.to_string()))?;

    tracing::info!(address = %addr, "Metrics exporter ready");
    Ok(async move { exporter.await.map_err(|e| format!("{:?}", e)) })
}

pub fn record_endpoint_call(method: Method, success: bool, took: Duration) {
    let outcome = if success { "success" } else { "error" };
    metrics::counter!(
        "company_endpoint_requests_total",
        "method" => method.as_str(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("company_endpoint_duration_seconds", "method" => method.as_str())
        .record(took.as_secs_f64());
}

pub fn record_rpc_connections(active: u64) {
    metrics::gauge!("company_rpc_active_connections").set(active as f64);
}
