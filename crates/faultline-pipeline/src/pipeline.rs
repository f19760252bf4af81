//! Exception pipeline entry point
//!
//! Every failure runs the same stages: issue a correlation id, classify,
//! log, build the envelope, attach headers. A panic in any stage turns the
//! result into the minimal unhandled-error envelope; the pipeline itself
//! never fails its caller.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use faultline_config::PipelineConfig;
use faultline_core::{FailureKind, RaisedFailure, RequestContext, ViewContext};
use faultline_telemetry::metrics::PipelineMetrics;
use http::header::{ACCESS_CONTROL_EXPOSE_HEADERS, CONTENT_LENGTH, CONTENT_TYPE, RETRY_AFTER};
use http::{HeaderMap, HeaderValue, StatusCode};

use crate::classify::classify;
use crate::correlation::CorrelationId;
use crate::envelope::{EnvelopeBuilder, PartialResponse};
use crate::error::PipelineFault;
use crate::headers::augment;
use crate::logging::{LogSink, StructuredLogger, TracingSink};
use crate::response::FinishedResponse;

/// Turns raised failures into enveloped responses
#[derive(Debug)]
pub struct ExceptionPipeline {
    builder: EnvelopeBuilder,
    logger: StructuredLogger,
    metrics: PipelineMetrics,
}

impl ExceptionPipeline {
    /// Create a pipeline logging through `tracing`
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// Create a pipeline writing log records to `sink`
    pub fn with_sink(config: &PipelineConfig, sink: Arc<dyn LogSink>) -> Self {
        let metrics = PipelineMetrics::global();

        Self {
            builder: EnvelopeBuilder::new(config.language),
            logger: StructuredLogger::new(sink, config, metrics.clone()),
            metrics,
        }
    }

    /// Handle a failure raised while serving `request`
    pub fn handle(&self, failure: &RaisedFailure, view: &ViewContext, request: &RequestContext) -> FinishedResponse {
        self.run(failure, view, request, None)
    }

    /// Handle a failure the framework already answered with `partial`
    pub fn rewrap(
        &self,
        failure: &RaisedFailure,
        view: &ViewContext,
        request: &RequestContext,
        partial: &PartialResponse,
    ) -> FinishedResponse {
        self.run(failure, view, request, Some(partial))
    }

    /// Records that never reached the log sink
    pub fn dropped_log_records(&self) -> u64 {
        self.logger.dropped()
    }

    fn run(
        &self,
        failure: &RaisedFailure,
        view: &ViewContext,
        request: &RequestContext,
        partial: Option<&PartialResponse>,
    ) -> FinishedResponse {
        let error_id = CorrelationId::issue();
        let path = request.path.as_deref();
        let method = request.method.as_deref();

        let kind = match stage("classify", || classify(failure)) {
            Ok(kind) => kind,
            Err(fault) => return self.fallback(&fault, failure, view, request, &error_id, false),
        };

        if let Err(fault) = stage("log", || self.logger.log(kind, failure, view, request, &error_id)) {
            return self.fallback(&fault, failure, view, request, &error_id, false);
        }

        let built = stage("format", || match partial {
            Some(partial) => self.builder.rewrap(kind, failure, &error_id, path, method, partial),
            None => self.builder.build(kind, failure, &error_id, path, method),
        });
        let (envelope, status) = match built {
            Ok(built) => built,
            Err(fault) => return self.fallback(&fault, failure, view, request, &error_id, true),
        };

        let headers = match stage("headers", || {
            let mut headers = partial.map(|p| forwarded_headers(&p.headers)).unwrap_or_default();
            headers.extend(augment(status, kind, failure));
            headers
        }) {
            Ok(headers) => headers,
            Err(fault) => return self.fallback(&fault, failure, view, request, &error_id, true),
        };

        self.metrics.record_handled(&envelope.error_type, status.as_u16());

        FinishedResponse {
            status,
            envelope,
            headers,
        }
    }

    /// Minimal 500 answer after an internal fault
    ///
    /// The failure is logged here only if the log stage had not run yet, so
    /// each failure yields exactly one record.
    fn fallback(
        &self,
        fault: &PipelineFault,
        failure: &RaisedFailure,
        view: &ViewContext,
        request: &RequestContext,
        error_id: &CorrelationId,
        logged: bool,
    ) -> FinishedResponse {
        tracing::error!(
            stage = fault.stage,
            error_id = %error_id,
            error = %fault,
            "Exception pipeline faulted, answering with minimal envelope"
        );
        self.metrics.record_fault(fault.stage);

        if !logged {
            let logged = catch_unwind(AssertUnwindSafe(|| {
                self.logger
                    .log(FailureKind::UnhandledError, failure, view, request, error_id);
            }));
            if logged.is_err() {
                tracing::error!(error_id = %error_id, "Failed to log failure after pipeline fault");
            }
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static("Retry-After"));

        FinishedResponse {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            envelope: self
                .builder
                .minimal(error_id, request.path.as_deref(), request.method.as_deref()),
            headers,
        }
    }
}

fn stage<T>(name: &'static str, f: impl FnOnce() -> T) -> Result<T, PipelineFault> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| PipelineFault::from_panic(name, payload.as_ref()))
}

/// Framework headers worth keeping on the re-wrapped response
///
/// The body is replaced, so its framing headers are not. `Retry-After` is
/// owned by [`augment`] and must agree with the envelope.
fn forwarded_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| ![CONTENT_TYPE, CONTENT_LENGTH, RETRY_AFTER].contains(*name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
