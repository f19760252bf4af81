//! In-memory log sink shared between a test and its server

use std::sync::{Arc, Mutex};
use std::time::Duration;

use faultline_pipeline::{LogRecord, LogSink, SinkError};

/// Sink that keeps every record for inspection
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Wait until at least `count` records arrived
    pub async fn wait_for(&self, count: usize) -> Vec<LogRecord> {
        for _ in 0..100 {
            let records = self.records();
            if records.len() >= count {
                return records;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.records()
    }
}

impl LogSink for MemorySink {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
