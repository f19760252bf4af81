use faultline_core::RaisedFailure;

use crate::failure::Failure;

/// Fallback for requests no route matched
pub async fn not_found_handler() -> Failure {
    Failure::from(RaisedFailure::http_404())
}
