use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crate::engine::ValidationResult;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: validation passes. Labels: outcome (`valid` / `invalid`).
pub const VALIDATIONS_TOTAL: &str = "rendezvous_validations_total";

/// Counter: individual violations reported. Labels: kind.
pub const VIOLATIONS_TOTAL: &str = "rendezvous_violations_total";

/// Histogram: validation latency in seconds, store round-trips included.
pub const VALIDATION_DURATION_SECONDS: &str = "rendezvous_validation_duration_seconds";

/// Counter: committed writes. Labels: op.
pub const APPOINTMENTS_COMMITTED_TOTAL: &str = "rendezvous_appointments_committed_total";

/// Counter: appointments reported by the login-time due-soon check.
pub const DUE_SOON_MATCHES_TOTAL: &str = "rendezvous_due_soon_matches_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Console logging filtered by `RUST_LOG` (default `info`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (tests, embedding apps) keeps the first subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn record_validation(result: &ValidationResult, elapsed_secs: f64) {
    let outcome = if result.is_valid() { "valid" } else { "invalid" };
    metrics::counter!(VALIDATIONS_TOTAL, "outcome" => outcome).increment(1);
    for v in &result.violations {
        metrics::counter!(VIOLATIONS_TOTAL, "kind" => v.kind().label()).increment(1);
    }
    metrics::histogram!(VALIDATION_DURATION_SECONDS).record(elapsed_secs);
}
