//! Structured failure logging
//!
//! One [`LogRecord`] per handled failure. Writing never fails the caller:
//! sink errors and panics are swallowed and counted.

use std::backtrace::Backtrace;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use faultline_config::PipelineConfig;
use faultline_core::{FailureKind, RaisedFailure, RequestContext, ViewContext};
use faultline_telemetry::metrics::PipelineMetrics;
use tokio::sync::mpsc;

use crate::correlation::CorrelationId;
use crate::envelope::mapping;
use crate::error::SinkError;

/// Severity of a failure log record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    /// Severity and whether a stack capture is attached
    pub const fn for_kind(kind: FailureKind) -> (Self, bool) {
        match kind {
            FailureKind::ValidationError
            | FailureKind::PermissionDenied
            | FailureKind::NotFound
            | FailureKind::NotAuthenticated => (Self::Warning, false),
            FailureKind::UnhandledError => (Self::Error, true),
            _ => (Self::Error, false),
        }
    }
}

/// Operator-facing record of one handled failure
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub error_id: CorrelationId,
    pub kind: FailureKind,
    /// Wire `error_type` of the kind, as callers and metrics see it
    pub error_type: &'static str,
    /// Internal type name of the failure
    pub exception_type: String,
    /// Raw failure text; may contain internals and never reaches callers
    pub description: String,
    pub view: Option<String>,
    pub action: Option<String>,
    pub user: Option<String>,
    pub path: Option<String>,
    pub method: Option<String>,
    pub ip: Option<String>,
    pub severity: Severity,
    /// Stack capture, unhandled errors only
    pub stack: Option<String>,
}

impl LogRecord {
    /// Assemble a record from the failure and its ambient context
    pub fn new(
        kind: FailureKind,
        failure: &RaisedFailure,
        view: &ViewContext,
        request: &RequestContext,
        error_id: &CorrelationId,
        capture_stack: bool,
    ) -> Self {
        let (severity, wants_stack) = Severity::for_kind(kind);

        let stack = (wants_stack && capture_stack).then(|| {
            failure
                .stack
                .clone()
                .unwrap_or_else(|| Backtrace::force_capture().to_string())
        });

        Self {
            error_id: error_id.clone(),
            kind,
            error_type: mapping(kind).error_type,
            exception_type: failure.type_name.clone(),
            description: failure.describe(),
            view: view.name.clone(),
            action: view.action.clone(),
            user: request.caller.as_ref().map(|caller| caller.label().to_owned()),
            path: request.path.clone(),
            method: request.method.clone(),
            ip: request.client_ip(),
            severity,
            stack,
        }
    }
}

/// Destination for failure log records
///
/// Must tolerate concurrent writers.
pub trait LogSink: Send + Sync + 'static {
    /// Write one record
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be delivered
    fn write(&self, record: &LogRecord) -> Result<(), SinkError>;
}

/// Sink that emits each record as a `tracing` event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        let view = record.view.as_deref();
        let action = record.action.as_deref();
        let user = record.user.as_deref();
        let path = record.path.as_deref();
        let method = record.method.as_deref();
        let ip = record.ip.as_deref();

        match (record.severity, record.stack.as_deref()) {
            (Severity::Warning, _) => tracing::warn!(
                target: "faultline::failures",
                error_id = %record.error_id,
                error_type = record.error_type,
                kind = %record.kind,
                exception_type = %record.exception_type,
                view,
                action,
                user,
                path,
                method,
                ip,
                "API warning [{}]: {}",
                record.error_id,
                record.description,
            ),
            (Severity::Error, Some(stack)) => tracing::error!(
                target: "faultline::failures",
                error_id = %record.error_id,
                error_type = record.error_type,
                kind = %record.kind,
                exception_type = %record.exception_type,
                view,
                action,
                user,
                path,
                method,
                ip,
                stack,
                "Unhandled error [{}]: {}",
                record.error_id,
                record.description,
            ),
            (Severity::Error, None) => tracing::error!(
                target: "faultline::failures",
                error_id = %record.error_id,
                error_type = record.error_type,
                kind = %record.kind,
                exception_type = %record.exception_type,
                view,
                action,
                user,
                path,
                method,
                ip,
                "API error [{}]: {}",
                record.error_id,
                record.description,
            ),
        }

        Ok(())
    }
}

/// Delivers failure log records to a sink
///
/// In eager mode records are written inline. Otherwise they go through a
/// bounded queue to a background writer task, and a full or closed queue
/// drops the record. Without an async runtime the logger writes inline.
pub struct StructuredLogger {
    sink: Arc<dyn LogSink>,
    queue: Option<mpsc::Sender<LogRecord>>,
    capture_stack: bool,
    dropped: Arc<AtomicU64>,
    metrics: PipelineMetrics,
}

impl StructuredLogger {
    /// Create a logger, spawning the background writer unless eager
    pub fn new(sink: Arc<dyn LogSink>, config: &PipelineConfig, metrics: PipelineMetrics) -> Self {
        let dropped = Arc::new(AtomicU64::new(0));

        let queue = if config.eager_mode {
            None
        } else if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let (tx, rx) = mpsc::channel(config.log_queue_capacity.max(1));
            handle.spawn(write_loop(rx, Arc::clone(&sink), Arc::clone(&dropped), metrics.clone()));
            Some(tx)
        } else {
            tracing::debug!("no async runtime available, failure log records are written inline");
            None
        };

        Self {
            sink,
            queue,
            capture_stack: config.capture_stack,
            dropped,
            metrics,
        }
    }

    /// Log a handled failure
    pub fn log(
        &self,
        kind: FailureKind,
        failure: &RaisedFailure,
        view: &ViewContext,
        request: &RequestContext,
        error_id: &CorrelationId,
    ) {
        let record = LogRecord::new(kind, failure, view, request, error_id, self.capture_stack);
        self.dispatch(record);
    }

    /// Hand a prepared record to the sink
    pub fn dispatch(&self, record: LogRecord) {
        let Some(ref queue) = self.queue else {
            write_guarded(self.sink.as_ref(), &record, &self.dropped, &self.metrics);
            return;
        };

        if let Err(e) = queue.try_send(record) {
            let reason = match e {
                mpsc::error::TrySendError::Full(_) => "queue_full",
                mpsc::error::TrySendError::Closed(_) => "queue_closed",
            };
            self.dropped.fetch_add(1, Ordering::Relaxed);
            self.metrics.record_dropped(reason);
        }
    }

    /// Whether records are written on the caller's thread
    pub const fn is_inline(&self) -> bool {
        self.queue.is_none()
    }

    /// Records that never reached the sink
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for StructuredLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredLogger")
            .field("inline", &self.is_inline())
            .field("dropped", &self.dropped())
            .finish_non_exhaustive()
    }
}

/// Background task that drains the record queue
async fn write_loop(
    mut rx: mpsc::Receiver<LogRecord>,
    sink: Arc<dyn LogSink>,
    dropped: Arc<AtomicU64>,
    metrics: PipelineMetrics,
) {
    while let Some(record) = rx.recv().await {
        write_guarded(sink.as_ref(), &record, &dropped, &metrics);
    }

    tracing::debug!("failure log writer shutting down");
}

fn write_guarded(sink: &dyn LogSink, record: &LogRecord, dropped: &AtomicU64, metrics: &PipelineMetrics) {
    let reason = match catch_unwind(AssertUnwindSafe(|| sink.write(record))) {
        Ok(Ok(())) => return,
        Ok(Err(_)) => "sink_error",
        Err(_) => "sink_panic",
    };
    dropped.fetch_add(1, Ordering::Relaxed);
    metrics.record_dropped(reason);
}
