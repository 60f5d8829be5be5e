//! Subscriber setup with optional OpenTelemetry export

use opentelemetry::{trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    runtime,
    trace::{RandomIdGenerator, Sampler, Tracer, TracerProvider},
    Resource,
};
use tracing::Subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter,
};

use super::config::TracingConfig;
use crate::config::LogFormat;
use crate::infrastructure::logging::LoggingConfig;

/// Install the global subscriber for the server process
pub fn init_tracing(logging_config: &LoggingConfig, tracing_config: &TracingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging_config.level));

    let otel_result = match logging_config.format {
        LogFormat::Json => {
            let otel = otel_layer(tracing_config);
            let (layer, result) = split(otel);

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_span_events(FmtSpan::CLOSE)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(layer)
                .init();

            result
        }
        LogFormat::Pretty => {
            let otel = otel_layer(tracing_config);
            let (layer, result) = split(otel);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_target(true))
                .with(layer)
                .init();

            result
        }
    };

    match otel_result {
        Ok(true) => tracing::info!(
            endpoint = %tracing_config.otlp_endpoint,
            "Tracing initialized with OpenTelemetry export"
        ),
        Ok(false) => tracing::info!("Tracing initialized (OpenTelemetry disabled)"),
        Err(e) => tracing::warn!(error = %e, "Failed to initialize OpenTelemetry, export disabled"),
    }
}

fn split<L>(
    result: Result<Option<L>, opentelemetry::trace::TraceError>,
) -> (Option<L>, Result<bool, opentelemetry::trace::TraceError>) {
    match result {
        Ok(Some(layer)) => (Some(layer), Ok(true)),
        Ok(None) => (None, Ok(false)),
        Err(e) => (None, Err(e)),
    }
}

fn otel_layer<S>(
    config: &TracingConfig,
) -> Result<Option<OpenTelemetryLayer<S, Tracer>>, opentelemetry::trace::TraceError>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    if !config.enabled {
        return Ok(None);
    }

    let provider = build_tracer_provider(config)?;
    let tracer = provider.tracer(config.service_name.clone());
    opentelemetry::global::set_tracer_provider(provider);

    Ok(Some(tracing_opentelemetry::layer().with_tracer(tracer)))
}

fn build_tracer_provider(
    config: &TracingConfig,
) -> Result<TracerProvider, opentelemetry::trace::TraceError> {
    let resource = Resource::new(vec![KeyValue::new(
        "service.name",
        config.service_name.clone(),
    )]);

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.otlp_endpoint)
        .build()?;

    Ok(TracerProvider::builder()
        .with_sampler(sampler_for(config.sampling_ratio))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource)
        .with_batch_exporter(exporter, runtime::Tokio)
        .build())
}

fn sampler_for(ratio: f64) -> Sampler {
    if ratio >= 1.0 {
        Sampler::AlwaysOn
    } else if ratio <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(ratio)
    }
}

/// Flush pending spans
pub fn shutdown_tracing() {
    opentelemetry::global::shutdown_tracer_provider();
    tracing::info!("Tracing shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_selection() {
        assert!(matches!(sampler_for(1.0), Sampler::AlwaysOn));
        assert!(matches!(sampler_for(0.0), Sampler::AlwaysOff));
        assert!(matches!(sampler_for(-2.0), Sampler::AlwaysOff));
        assert!(matches!(sampler_for(0.25), Sampler::TraceIdRatioBased(r) if r == 0.25));
    }

    #[test]
    fn test_disabled_export_builds_no_layer() {
        let config = TracingConfig::default();
        let layer = otel_layer::<tracing_subscriber::Registry>(&config).unwrap();
        assert!(layer.is_none());
    }
}
