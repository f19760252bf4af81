//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use faultline_config::{Config, HealthConfig, Language, PipelineConfig, ServerConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with inline logging so records are visible immediately
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        enabled: true,
                        ..HealthConfig::default()
                    },
                },
                pipeline: PipelineConfig {
                    eager_mode: true,
                    ..PipelineConfig::default()
                },
                ..Config::default()
            },
        }
    }

    /// Set the language of envelope messages
    pub fn with_language(mut self, language: Language) -> Self {
        self.config.pipeline.language = language;
        self
    }

    /// Hand log records to the background writer instead of writing inline
    pub fn with_background_logging(mut self, queue_capacity: usize) -> Self {
        self.config.pipeline.eager_mode = false;
        self.config.pipeline.log_queue_capacity = queue_capacity;
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
