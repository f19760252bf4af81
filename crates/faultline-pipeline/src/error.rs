use std::any::Any;

use thiserror::Error;

/// Failure to deliver a log record
#[derive(Debug, Error)]
pub enum SinkError {
    /// Destination cannot accept records right now
    #[error("Log sink unavailable: {0}")]
    Unavailable(String),

    /// Record could not be encoded for the destination
    #[error("Failed to encode log record: {0}")]
    Encode(String),
}

/// Internal fault inside one pipeline stage
///
/// Never reaches callers; the pipeline answers with the minimal
/// unhandled-error envelope instead.
#[derive(Debug, Error)]
#[error("Pipeline stage '{stage}' faulted: {message}")]
pub struct PipelineFault {
    pub stage: &'static str,
    pub message: String,
}

impl PipelineFault {
    /// Build a fault from a caught panic payload
    pub fn from_panic(stage: &'static str, payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());

        Self { stage, message }
    }
}
