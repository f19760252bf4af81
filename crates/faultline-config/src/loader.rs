use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, TOML parsing fails,
    /// or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if TOML parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_server_config()?;
        self.validate_pipeline_config()?;
        self.validate_telemetry_config()?;
        Ok(())
    }

    fn validate_server_config(&self) -> anyhow::Result<()> {
        let health = &self.server.health;
        if health.enabled && !health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/': `{}`", health.path);
        }
        Ok(())
    }

    fn validate_pipeline_config(&self) -> anyhow::Result<()> {
        if self.pipeline.log_queue_capacity == 0 {
            anyhow::bail!("pipeline.log_queue_capacity must be greater than 0");
        }
        Ok(())
    }

    fn validate_telemetry_config(&self) -> anyhow::Result<()> {
        let telemetry = &self.telemetry;

        if telemetry.service_name.trim().is_empty() {
            anyhow::bail!("telemetry.service_name must not be empty");
        }

        EnvFilter::try_new(&telemetry.log_filter)
            .map_err(|e| anyhow::anyhow!("invalid telemetry.log_filter `{}`: {e}", telemetry.log_filter))?;

        if !(0.0..=1.0).contains(&telemetry.sampling_rate) {
            anyhow::bail!("telemetry.sampling_rate must be between 0.0 and 1.0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::{Language, LogFormat, OtlpProtocol};

    use super::*;

    #[test]
    fn empty_file_is_valid() {
        let config = Config::parse("").unwrap();
        assert!(config.server.health.enabled);
        assert_eq!(config.server.health.path, "/health");
        assert_eq!(config.telemetry.service_name, "faultline");
        assert_eq!(config.telemetry.log_format, LogFormat::Text);
        assert!(config.telemetry.exporter.is_none());
    }

    #[test]
    fn deserialize_full_config() {
        let raw = r#"
            [server]
            listen_address = "127.0.0.1:8080"

            [server.health]
            path = "/healthz"

            [pipeline]
            eager_mode = true
            language = "ru"

            [telemetry]
            service_name = "blog-api"
            log_filter = "faultline=debug,info"
            log_format = "json"

            [telemetry.exporter]
            endpoint = "http://localhost:4318"
            protocol = "http_proto"
        "#;

        let config = Config::parse(raw).unwrap();
        assert_eq!(config.server.listen_address, Some("127.0.0.1:8080".parse().unwrap()));
        assert_eq!(config.server.health.path, "/healthz");
        assert!(config.pipeline.eager_mode);
        assert_eq!(config.pipeline.language, Language::Ru);
        assert_eq!(config.telemetry.log_format, LogFormat::Json);

        let exporter = config.telemetry.exporter.unwrap();
        assert_eq!(exporter.protocol, OtlpProtocol::HttpProto);
        assert_eq!(exporter.metrics_interval, 30);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Config::parse("[pipeline]\neager = true").unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn zero_queue_capacity_is_rejected() {
        for raw in [
            "[pipeline]\nlog_queue_capacity = 0",
            "[pipeline]\neager_mode = true\nlog_queue_capacity = 0",
        ] {
            let err = Config::parse(raw).unwrap_err();
            assert!(err.to_string().contains("log_queue_capacity"), "{raw}");
        }

        assert!(Config::parse("[pipeline]\neager_mode = true\nlog_queue_capacity = 1").is_ok());
    }

    #[test]
    fn health_path_must_be_absolute() {
        let err = Config::parse("[server.health]\npath = \"health\"").unwrap_err();
        assert!(err.to_string().contains("server.health.path"));
    }

    #[test]
    fn sampling_rate_out_of_range() {
        let err = Config::parse("[telemetry]\nsampling_rate = 1.5").unwrap_err();
        assert!(err.to_string().contains("sampling_rate"));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nlanguage = \"ru\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.pipeline.language, Language::Ru);
    }

    #[test]
    fn load_missing_file_names_path() {
        let err = Config::load(Path::new("/nonexistent/faultline.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/faultline.toml"));
    }
}
