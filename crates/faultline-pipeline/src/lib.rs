//! Error normalization and response envelopes
//!
//! Converts any failure raised while serving a request into a uniform JSON
//! envelope with a correlation id, and writes one structured log record
//! carrying the same id.

#![allow(clippy::must_use_candidate)]

mod classify;
mod correlation;
mod details;
mod envelope;
mod error;
mod headers;
mod logging;
mod messages;
mod pipeline;
mod response;

pub use classify::{classify, integrity_kind};
pub use correlation::CorrelationId;
pub use details::normalize;
pub use envelope::{EnvelopeBuilder, ErrorEnvelope, Mapping, PartialResponse, mapping};
pub use error::{PipelineFault, SinkError};
pub use headers::augment;
pub use logging::{LogRecord, LogSink, Severity, StructuredLogger, TracingSink};
pub use messages::Catalog;
pub use pipeline::ExceptionPipeline;
pub use response::{Enveloped, FinishedResponse};
