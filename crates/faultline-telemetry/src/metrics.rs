//! Metric name constants and recording helpers

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Meter};

/// Failures turned into envelopes, by `error_type` and `status`
pub const FAILURES_HANDLED: &str = "faultline.failures.handled";
/// Log records that never reached the sink, by `reason`
pub const LOG_RECORDS_DROPPED: &str = "faultline.log.dropped";
/// Pipeline stages that faulted and fell back to the minimal envelope, by `stage`
pub const PIPELINE_FAULTS: &str = "faultline.pipeline.faults";

/// Counters recorded by the exception pipeline
///
/// Instruments come from the global meter provider, so they are no-ops
/// until telemetry export is configured.
#[derive(Clone)]
pub struct PipelineMetrics {
    failures_handled: Counter<u64>,
    log_records_dropped: Counter<u64>,
    pipeline_faults: Counter<u64>,
}

impl PipelineMetrics {
    /// Create instruments on the global `faultline` meter
    pub fn global() -> Self {
        Self::new(&opentelemetry::global::meter("faultline"))
    }

    /// Create instruments on the given meter
    pub fn new(meter: &Meter) -> Self {
        Self {
            failures_handled: meter
                .u64_counter(FAILURES_HANDLED)
                .with_description("Failures converted into error envelopes")
                .build(),
            log_records_dropped: meter
                .u64_counter(LOG_RECORDS_DROPPED)
                .with_description("Failure log records dropped before reaching the sink")
                .build(),
            pipeline_faults: meter
                .u64_counter(PIPELINE_FAULTS)
                .with_description("Internal pipeline faults downgraded to a minimal envelope")
                .build(),
        }
    }

    pub fn record_handled(&self, error_type: &str, status: u16) {
        self.failures_handled.add(
            1,
            &[
                KeyValue::new("error_type", error_type.to_owned()),
                KeyValue::new("status", i64::from(status)),
            ],
        );
    }

    pub fn record_dropped(&self, reason: &'static str) {
        self.log_records_dropped.add(1, &[KeyValue::new("reason", reason)]);
    }

    pub fn record_fault(&self, stage: &'static str) {
        self.pipeline_faults.add(1, &[KeyValue::new("stage", stage)]);
    }
}

impl std::fmt::Debug for PipelineMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineMetrics").finish_non_exhaustive()
    }
}
