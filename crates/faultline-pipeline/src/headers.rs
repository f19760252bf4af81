use faultline_core::{FailureKind, RaisedFailure};
use http::header::{ACCESS_CONTROL_EXPOSE_HEADERS, HeaderMap, HeaderValue, RETRY_AFTER};
use http::StatusCode;

/// Transport headers an envelope response carries
///
/// `Retry-After` is exposed to browsers on every error response so
/// clients can read it without knowing the kind up front. Rate-limited
/// failures with a known wait also set it.
pub fn augment(_status: StatusCode, kind: FailureKind, failure: &RaisedFailure) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if kind == FailureKind::RateLimited
        && let Some(seconds) = failure.retry_after()
    {
        headers.insert(RETRY_AFTER, HeaderValue::from(seconds));
    }

    headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static("Retry-After"));

    headers
}
