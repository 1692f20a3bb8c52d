use crate::Environment;
use crate::config::env_parse;
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    metrics::{PeriodicReader, SdkMeterProvider},
    trace::{Sampler, SdkTracerProvider},
};
use opentelemetry_semantic_conventions::attribute::{SERVICE_NAME, SERVICE_VERSION};
use std::env;
use std::time::Duration;

const DEFAULT_EXPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Where and how often a program exports its spans and run metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySettings {
    pub service_name: String,
    /// OTLP gRPC collector, e.g. `http://localhost:4317`
    pub endpoint: String,
    pub environment: Environment,
    pub export_interval: Duration,
}

impl TelemetrySettings {
    /// `None` unless `OTEL_ENDPOINT` is set.
    ///
    /// `OTEL_EXPORT_INTERVAL_SECS` shortens or lengthens the metric export
    /// period (default 5 s).
    pub fn from_env(service_name: &str, environment: Environment) -> Option<Self> {
        let endpoint = env::var("OTEL_ENDPOINT")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())?;

        let export_interval = env_parse::<u64>("OTEL_EXPORT_INTERVAL_SECS")
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_EXPORT_INTERVAL);

        Some(Self {
            service_name: service_name.to_string(),
            endpoint,
            environment,
            export_interval,
        })
    }

    fn resource(&self) -> Resource {
        Resource::builder()
            .with_attributes([
                KeyValue::new(SERVICE_NAME, self.service_name.clone()),
                KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                KeyValue::new("deployment.environment", self.environment.as_str()),
            ])
            .build()
    }
}

/// Holds the OTLP providers for the lifetime of a run.
///
/// Dropping the guard flushes pending spans and the final run-latency
/// histogram, so keep it alive until the report has been printed.
pub struct TelemetryGuard {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl TelemetryGuard {
    /// Install OTLP exporters and the global subscriber bridging `tracing`
    /// spans to OpenTelemetry.
    pub fn init(settings: &TelemetrySettings) -> anyhow::Result<Self> {
        let resource = settings.resource();

        let tracer_provider = SdkTracerProvider::builder()
            .with_resource(resource.clone())
            .with_sampler(Sampler::AlwaysOn)
            .with_batch_exporter(
                opentelemetry_otlp::SpanExporter::builder()
                    .with_tonic()
                    .with_endpoint(settings.endpoint.as_str())
                    .build()?,
            )
            .build();
        global::set_tracer_provider(tracer_provider.clone());

        let reader = PeriodicReader::builder(
            opentelemetry_otlp::MetricExporter::builder()
                .with_tonic()
                .with_endpoint(settings.endpoint.as_str())
                .build()?,
        )
        .with_interval(settings.export_interval)
        .build();
        let meter_provider = SdkMeterProvider::builder()
            .with_resource(resource)
            .with_reader(reader)
            .build();
        global::set_meter_provider(meter_provider.clone());

        let otel_layer = tracing_opentelemetry::layer()
            .with_tracer(global::tracer(settings.service_name.clone()));
        crate::logging::install(&settings.environment, Some(otel_layer));

        tracing::info!(
            endpoint = %settings.endpoint,
            interval_secs = settings.export_interval.as_secs(),
            "Telemetry export enabled"
        );

        Ok(Self {
            tracer_provider,
            meter_provider,
        })
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        // The subscriber may already be torn down, so report on stderr directly
        if let Err(e) = self.tracer_provider.shutdown() {
            eprintln!("Failed to shutdown tracer provider: {:?}", e);
        }
        if let Err(e) = self.meter_provider.shutdown() {
            eprintln!("Failed to shutdown meter provider: {:?}", e);
        }
    }
}

/// Set up logging, exporting to OTLP when `OTEL_ENDPOINT` is set.
///
/// The returned guard (if any) must be held until the program finishes.
pub fn init_observability(
    service_name: &str,
    environment: Environment,
) -> anyhow::Result<Option<TelemetryGuard>> {
    match TelemetrySettings::from_env(service_name, environment.clone()) {
        Some(settings) => TelemetryGuard::init(&settings).map(Some),
        None => {
            crate::setup_logging(environment);
            Ok(None)
        }
    }
}

/// Creates an info-level span and enters it.
#[macro_export]
macro_rules! span {
    ($name:literal) => {
        tracing::info_span!($name).entered()
    };
}
