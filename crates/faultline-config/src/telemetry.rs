use serde::Deserialize;
use url::Url;

/// Logging and telemetry configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// `service.name` reported with exported traces and metrics
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// `EnvFilter` directive for log output (e.g. `faultline::failures=warn,info`)
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Where traces and metrics go; nothing is exported when absent
    #[serde(default)]
    pub exporter: Option<OtlpExporter>,
    /// Fraction of root traces sampled, 0.0 to 1.0
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_filter: default_log_filter(),
            log_format: LogFormat::default(),
            exporter: None,
            sampling_rate: default_sampling_rate(),
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per line, event fields flattened
    Json,
}

/// OTLP collector shared by traces and metrics
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtlpExporter {
    pub endpoint: Url,
    #[serde(default)]
    pub protocol: OtlpProtocol,
    /// Seconds between metric pushes
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval: u64,
}

/// Wire protocol spoken to the collector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtlpProtocol {
    #[default]
    Grpc,
    HttpProto,
}

fn default_service_name() -> String {
    "faultline".to_owned()
}

fn default_log_filter() -> String {
    "info".to_owned()
}

const fn default_sampling_rate() -> f64 {
    1.0
}

const fn default_metrics_interval() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exporter_defaults_to_grpc() {
        let config: TelemetryConfig = toml::from_str(
            r#"
            [exporter]
            endpoint = "http://collector:4317"
            "#,
        )
        .unwrap();

        let exporter = config.exporter.unwrap();
        assert_eq!(exporter.protocol, OtlpProtocol::Grpc);
        assert_eq!(exporter.metrics_interval, 30);
        assert_eq!(exporter.endpoint.as_str(), "http://collector:4317/");
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(toml::from_str::<TelemetryConfig>("[exporter]\nendpoint = \"not a url\"").is_err());
    }
}
