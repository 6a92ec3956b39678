//! Logging and telemetry helpers shared by the relay binaries.
//!
//! Installs a `tracing` subscriber (plain or JSON, optionally exporting over OTLP), and offers
//! small label and counter helpers so call sites stay free of exporter details.

mod config;
mod context;
mod metrics;
mod tracing_init;

pub use config::{TelemetryConfig, TelemetryProtocol};
pub use context::TelemetryLabels;
pub use metrics::{record_counter, record_histogram};
pub use tracing_init::{init_telemetry, telemetry_enabled, with_common_fields};

/// Installs telemetry for `service_name` using only environment configuration.
pub fn install(service_name: &str, service_version: &str) -> anyhow::Result<()> {
    init_telemetry(TelemetryConfig::from_env(service_name, service_version))
}
