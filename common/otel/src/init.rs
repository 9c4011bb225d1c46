//! Process-wide logging/tracing initialization (§10.1).

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Holds the OpenTelemetry tracer provider alive for the process lifetime;
/// dropping it flushes pending spans. Returned by [`init_tracing`] so the
/// binary can keep it in scope for the duration of `main`.
pub struct TelemetryGuard {
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take()
            && let Err(error) = provider.shutdown()
        {
            eprintln!("otel tracer shutdown failed: {error}");
        }
    }
}

/// Initialize the global tracing subscriber: an `EnvFilter`-gated fmt layer
/// always, plus an OTLP span exporter layer when `OTEL_EXPORTER_OTLP_ENDPOINT`
/// is set in the environment.
///
/// `RUST_LOG` (or `HELM_LOG`, checked first) controls verbosity; defaults to
/// `info` for this crate family and `warn` for dependencies.
pub fn init_tracing(service_name: &str) -> TelemetryGuard {
    let filter = EnvFilter::try_from_env("HELM_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn,helm=info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    let tracer_provider = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .ok()
        .and_then(|_| build_tracer_provider(service_name).ok());

    let otel_layer = tracer_provider.as_ref().map(|provider| {
        use opentelemetry::trace::TracerProvider as _;
        tracing_opentelemetry::layer().with_tracer(provider.tracer(service_name.to_string()))
    });

    let registry = tracing_subscriber::registry().with(filter).with(fmt_layer).with(otel_layer);

    if let Err(error) = registry.try_init() {
        eprintln!("tracing subscriber already initialized: {error}");
    }

    TelemetryGuard { tracer_provider }
}

fn build_tracer_provider(
    service_name: &str,
) -> Result<opentelemetry_sdk::trace::SdkTracerProvider, opentelemetry_otlp::ExporterBuildError> {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::Resource;
    use opentelemetry_sdk::trace::SdkTracerProvider;

    let exporter = opentelemetry_otlp::SpanExporter::builder().with_tonic().build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            Resource::builder()
                .with_attribute(KeyValue::new("service.name", service_name.to_string()))
                .build(),
        )
        .build())
}
