use crate::RaisedFailure;

/// Trait for domain errors that can be raised into the failure pipeline
///
/// Implemented by each feature's error type. The transport layer hands
/// the resulting [`RaisedFailure`] to the pipeline, keeping domain errors
/// decoupled from the wire envelope.
pub trait IntoFailure: std::error::Error {
    /// Describe this error as a raised failure
    fn to_failure(&self) -> RaisedFailure;
}

impl IntoFailure for serde_json::Error {
    fn to_failure(&self) -> RaisedFailure {
        match self.classify() {
            serde_json::error::Category::Io => RaisedFailure::unrecognized("IoError", self.to_string()),
            _ => RaisedFailure::parse_error(self.to_string()),
        }
    }
}
