#![allow(clippy::must_use_candidate)]

mod loader;
pub mod pipeline;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use pipeline::*;
pub use server::*;
pub use telemetry::{LogFormat, OtlpExporter, OtlpProtocol, TelemetryConfig};

/// Top-level faultline configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Exception pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Logging and telemetry configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
