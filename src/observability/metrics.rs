//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): proxied requests by method, status, service
//! - `gateway_request_duration_seconds` (histogram): proxy latency
//! - `dispatch_attempts_total` (counter): service-client attempts by service
//! - `dispatch_retries_total` (counter): scheduled retries by service
//! - `classified_errors_total` (counter): classifier outcomes by action
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_proxy_request(method: &str, status: u16, service: &str, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    let service = service.to_string();
    ::metrics::counter!(
        "gateway_requests_total",
        "method" => method.clone(),
        "status" => status.clone(),
        "service" => service.clone()
    )
    .increment(1);
    ::metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method,
        "status" => status,
        "service" => service
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_dispatch_attempt(service: &str) {
    ::metrics::counter!("dispatch_attempts_total", "service" => service.to_string()).increment(1);
}

pub fn record_dispatch_retry(service: &str) {
    ::metrics::counter!("dispatch_retries_total", "service" => service.to_string()).increment(1);
}

pub fn record_classified(action: &'static str) {
    ::metrics::counter!("classified_errors_total", "action" => action).increment(1);
}
