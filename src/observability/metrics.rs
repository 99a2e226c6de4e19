//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define pipeline metrics (emissions, latency)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `router_emissions_total` (counter): emissions by method, status, stage
//! - `router_emission_duration_seconds` (histogram): latency by method
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op
//! - `stage` is where an emission stopped: `finalized` or the failing stage

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const EMISSIONS_TOTAL: &str = "router_emissions_total";
pub const EMISSION_DURATION: &str = "router_emission_duration_seconds";

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one completed emission.
pub fn record_emission(method: &str, status: u16, stage: &'static str, started: Instant) {
    metrics::counter!(
        EMISSIONS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string(),
        "stage" => stage
    )
    .increment(1);
    metrics::histogram!(EMISSION_DURATION, "method" => method.to_string())
        .record(started.elapsed().as_secs_f64());
}
