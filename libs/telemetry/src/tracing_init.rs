use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{
    Resource,
    metrics::{PeriodicReader, SdkMeterProvider},
    propagation::TraceContextPropagator,
    trace::SdkTracerProvider,
};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::layer::Layer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{TelemetryConfig, TelemetryProtocol};

const METRICS_EXPORT_INTERVAL: Duration = Duration::from_secs(15);

static INIT: OnceLock<()> = OnceLock::new();
static TELEMETRY_ENABLED: AtomicBool = AtomicBool::new(false);

/// Installs the global subscriber once; later calls only refresh the exporter flag.
pub fn init_telemetry(cfg: TelemetryConfig) -> Result<()> {
    let exporters_enabled = cfg.exporter_enabled();
    TELEMETRY_ENABLED.store(exporters_enabled, Ordering::SeqCst);
    if INIT.get().is_some() {
        return Ok(());
    }

    let fmt_layer = if cfg.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(false).boxed()
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if exporters_enabled {
        let resource = build_resource(&cfg);
        let tracer_provider = SdkTracerProvider::builder()
            .with_resource(resource.clone())
            .with_batch_exporter(build_span_exporter(&cfg)?)
            .build();
        let tracer = tracer_provider.tracer(cfg.service_name.clone());
        global::set_tracer_provider(tracer_provider);
        global::set_text_map_propagator(TraceContextPropagator::new());

        let reader = PeriodicReader::builder(build_metric_exporter(&cfg)?)
            .with_interval(METRICS_EXPORT_INTERVAL)
            .build();
        let meter_provider = SdkMeterProvider::builder()
            .with_resource(resource)
            .with_reader(reader)
            .build();
        global::set_meter_provider(meter_provider);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(OpenTelemetryLayer::new(tracer))
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .ok();
    }

    INIT.set(()).ok();
    tracing::debug!(
        service = %cfg.service_name,
        environment = %cfg.environment,
        otlp = exporters_enabled,
        "telemetry installed"
    );
    Ok(())
}

pub fn telemetry_enabled() -> bool {
    TELEMETRY_ENABLED.load(Ordering::SeqCst)
}

/// Records the request id on a span that declares `request_id` as `Empty`.
pub fn with_common_fields(span: &Span, request_id: Option<&str>) {
    if let Some(request_id) = request_id {
        span.record("request_id", tracing::field::display(request_id));
    }
}

fn build_span_exporter(cfg: &TelemetryConfig) -> Result<SpanExporter> {
    let exporter = match cfg.protocol {
        TelemetryProtocol::Grpc => SpanExporter::builder()
            .with_tonic()
            .with_endpoint(cfg.endpoint.clone())
            .build(),
        TelemetryProtocol::HttpProtobuf => SpanExporter::builder()
            .with_http()
            .with_endpoint(cfg.endpoint.clone())
            .build(),
    };
    exporter.context("build OTLP span exporter")
}

fn build_metric_exporter(cfg: &TelemetryConfig) -> Result<MetricExporter> {
    let exporter = match cfg.protocol {
        TelemetryProtocol::Grpc => MetricExporter::builder()
            .with_tonic()
            .with_endpoint(cfg.endpoint.clone())
            .build(),
        TelemetryProtocol::HttpProtobuf => MetricExporter::builder()
            .with_http()
            .with_endpoint(cfg.endpoint.clone())
            .build(),
    };
    exporter.context("build OTLP metric exporter")
}

fn build_resource(cfg: &TelemetryConfig) -> Resource {
    Resource::builder_empty()
        .with_service_name(cfg.service_name.clone())
        .with_attributes([
            KeyValue::new("service.version", cfg.service_version.clone()),
            KeyValue::new("deployment.environment", cfg.environment.clone()),
        ])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn request_id_is_recorded_on_span() {
        let span = tracing::info_span!("webhook.request", request_id = tracing::field::Empty);
        with_common_fields(&span, Some("5f0c2d9e-request"));
        span.in_scope(|| tracing::info!("handled"));
        assert!(logs_contain("request_id=5f0c2d9e-request"));
    }
}
