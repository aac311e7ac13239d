//! Tracing setup with optional OpenTelemetry export
//!
//! Logs always go to stdout (text or JSON). When telemetry is enabled, spans
//! are additionally exported to an OTLP collector over gRPC.

use opentelemetry::{KeyValue, trace::TracerProvider as _};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource, runtime,
    trace::{RandomIdGenerator, Sampler, TracerProvider},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// OpenTelemetry tracer guard
///
/// When dropped, flushes all pending spans and shuts down the tracer
pub struct TelemetryGuard;

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        opentelemetry::global::shutdown_tracer_provider();
    }
}

/// Logging and telemetry options
#[derive(Debug, Clone)]
pub struct TracingOptions {
    /// Default filter when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON lines instead of text
    pub json: bool,
    /// Export spans over OTLP
    pub otel_enabled: bool,
    pub service_name: String,
    pub otlp_endpoint: String,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            json: false,
            otel_enabled: false,
            service_name: "health-server".into(),
            otlp_endpoint: "http://localhost:4317".into(),
        }
    }
}

/// Build an OTLP tracer provider for the given service
///
/// Must be called from within a Tokio runtime (the batch processor spawns
/// onto it).
pub fn init_tracer_provider(
    service_name: &str,
    otlp_endpoint: &str,
) -> Result<TracerProvider, Box<dyn std::error::Error>> {
    tracing::info!(
        service_name = service_name,
        otlp_endpoint = otlp_endpoint,
        "Initializing OpenTelemetry tracing"
    );

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(otlp_endpoint)
        .build()?;

    let resource = Resource::new(vec![
        KeyValue::new("service.name", service_name.to_string()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION").to_string()),
    ]);

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource)
        .build();

    Ok(provider)
}

/// Setup tracing-subscriber, optionally with an OpenTelemetry layer
///
/// Returns a guard that must be kept alive for the duration of the program
/// when telemetry is enabled.
pub async fn setup_tracing(
    options: &TracingOptions,
) -> Result<Option<TelemetryGuard>, Box<dyn std::error::Error>> {
    if !options.otel_enabled {
        common::logging::init(&options.log_level, options.json)?;
        tracing::info!("Tracing initialized without OpenTelemetry");
        return Ok(None);
    }

    let provider = init_tracer_provider(&options.service_name, &options.otlp_endpoint)?;
    let tracer = provider.tracer("health-server");
    opentelemetry::global::set_tracer_provider(provider);

    let json = options.json;
    tracing_subscriber::registry()
        .with(common::logging::env_filter(&options.log_level))
        .with((!json).then(|| fmt::layer()))
        .with(json.then(|| fmt::layer().json()))
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()?;

    tracing::info!("Tracing initialized with OpenTelemetry integration");

    Ok(Some(TelemetryGuard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = TracingOptions::default();
        assert_eq!(options.log_level, "info");
        assert!(!options.json);
        assert!(!options.otel_enabled);
    }

    #[tokio::test]
    async fn test_setup_without_otel() {
        // Another test may already own the global subscriber
        let result = setup_tracing(&TracingOptions::default()).await;
        if let Ok(guard) = result {
            assert!(guard.is_none());
        }
    }
}
