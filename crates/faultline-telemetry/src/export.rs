//! OTLP export of traces and metrics

use std::time::Duration;

use faultline_config::{OtlpExporter, OtlpProtocol, TelemetryConfig};
use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};

/// Installed OTLP providers
pub struct Providers {
    meters: SdkMeterProvider,
    tracers: SdkTracerProvider,
}

impl Providers {
    /// Build both providers and register them globally
    ///
    /// Returns the providers plus the tracer that bridges `tracing` spans.
    pub fn install(config: &TelemetryConfig, exporter: &OtlpExporter) -> anyhow::Result<(Self, SdkTracer)> {
        let resource = resource(config);

        let metric_exporter = match exporter.protocol {
            OtlpProtocol::Grpc => MetricExporter::builder()
                .with_tonic()
                .with_endpoint(exporter.endpoint.as_str())
                .build(),
            OtlpProtocol::HttpProto => MetricExporter::builder()
                .with_http()
                .with_endpoint(exporter.endpoint.as_str())
                .build(),
        }
        .map_err(|e| anyhow::anyhow!("failed to build {:?} metric exporter: {e}", exporter.protocol))?;

        let span_exporter = match exporter.protocol {
            OtlpProtocol::Grpc => SpanExporter::builder()
                .with_tonic()
                .with_endpoint(exporter.endpoint.as_str())
                .build(),
            OtlpProtocol::HttpProto => SpanExporter::builder()
                .with_http()
                .with_endpoint(exporter.endpoint.as_str())
                .build(),
        }
        .map_err(|e| anyhow::anyhow!("failed to build {:?} span exporter: {e}", exporter.protocol))?;

        let meters = SdkMeterProvider::builder()
            .with_resource(resource.clone())
            .with_reader(
                PeriodicReader::builder(metric_exporter)
                    .with_interval(Duration::from_secs(exporter.metrics_interval))
                    .build(),
            )
            .build();

        let tracers = SdkTracerProvider::builder()
            .with_resource(resource)
            .with_sampler(Sampler::ParentBased(Box::new(sampler(config.sampling_rate))))
            .with_batch_exporter(span_exporter)
            .build();

        opentelemetry::global::set_meter_provider(meters.clone());
        opentelemetry::global::set_tracer_provider(tracers.clone());
        let tracer = tracers.tracer("faultline");

        Ok((Self { meters, tracers }, tracer))
    }

    pub fn flush(&self) -> anyhow::Result<()> {
        self.meters
            .force_flush()
            .map_err(|e| anyhow::anyhow!("failed to flush metrics: {e}"))
    }

    pub fn shutdown(self) {
        if let Err(e) = self.meters.shutdown() {
            eprintln!("failed to shutdown meter provider: {e}");
        }
        if let Err(e) = self.tracers.shutdown() {
            eprintln!("failed to shutdown tracer provider: {e}");
        }
    }
}

fn resource(config: &TelemetryConfig) -> Resource {
    Resource::builder()
        .with_attributes([
            KeyValue::new(SERVICE_NAME, config.service_name.clone()),
            KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        ])
        .build()
}

/// Root sampler for a configured rate
fn sampler(rate: f64) -> Sampler {
    match rate {
        r if r >= 1.0 => Sampler::AlwaysOn,
        r if r <= 0.0 => Sampler::AlwaysOff,
        r => Sampler::TraceIdRatioBased(r),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_clamps_extremes() {
        assert!(matches!(sampler(1.0), Sampler::AlwaysOn));
        assert!(matches!(sampler(0.0), Sampler::AlwaysOff));
        assert!(matches!(sampler(0.25), Sampler::TraceIdRatioBased(r) if (r - 0.25).abs() < f64::EPSILON));
    }

    #[test]
    fn resource_names_the_service() {
        let config = TelemetryConfig {
            service_name: "blog-api".to_owned(),
            ..TelemetryConfig::default()
        };
        let resource = resource(&config);
        let name = resource
            .get(&opentelemetry::Key::from_static_str(SERVICE_NAME))
            .map(|value| value.to_string());
        assert_eq!(name.as_deref(), Some("blog-api"));
    }
}
