//! Metrics collection and exposition.
//!
//! # Metrics
//! - `stashbox_requests_total` (counter): requests by method, provider, status
//! - `stashbox_request_duration_seconds` (histogram): latency by provider
//!
//! # Design Decisions
//! - Recording is always on; without an installed recorder the macros
//!   are no-ops
//! - The Prometheus exporter only starts when an address is configured

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "stashbox_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "stashbox_request_duration_seconds";

/// Start the Prometheus scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one completed request.
pub fn record_request(method: &str, provider: &str, status: u16, start: Instant) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "provider" => provider.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        REQUEST_DURATION_SECONDS,
        "provider" => provider.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
