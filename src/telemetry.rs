use opentelemetry::trace::TraceId;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};

///  Fetch an opentelemetry::trace::TraceId as hex through the full tracing stack
pub fn get_trace_id() -> TraceId {
    use opentelemetry::trace::TraceContextExt as _; // opentelemetry::Context -> opentelemetry::trace::Span
    use tracing_opentelemetry::OpenTelemetrySpanExt as _; // tracing::Span to opentelemetry::Context

    tracing::Span::current()
        .context()
        .span()
        .span_context()
        .trace_id()
}

/// Initialize tracing
pub async fn init() -> anyhow::Result<()> {
    use opentelemetry::trace::TracerProvider as _;
    #[cfg(feature = "telemetry")]
    use opentelemetry_otlp::SpanExporter;
    use opentelemetry_sdk::trace::SdkTracerProvider;

    #[cfg(feature = "telemetry")]
    let exporter = SpanExporter::builder().with_tonic().build()?;
    let builder = SdkTracerProvider::builder();
    #[cfg(feature = "telemetry")]
    let builder = builder.with_batch_exporter(exporter);
    let tracer = builder.build().tracer("ci-chat-bot");

    // Setup tracing layers
    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
    let logger = tracing_subscriber::fmt::layer().compact();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Decide on layers
    let collector = Registry::default()
        .with(telemetry)
        .with(logger)
        .with(env_filter);

    // Initialize tracing
    tracing::subscriber::set_global_default(collector)?;
    Ok(())
}
