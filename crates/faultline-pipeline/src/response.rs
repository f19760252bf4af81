use axum::Json;
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, StatusCode};

use crate::envelope::ErrorEnvelope;

/// Marker extension on responses that already carry an error envelope
#[derive(Debug, Clone, Copy)]
pub struct Enveloped;

/// Pipeline output ready to be sent to the caller
#[derive(Debug, Clone)]
pub struct FinishedResponse {
    pub status: StatusCode,
    pub envelope: ErrorEnvelope,
    pub headers: HeaderMap,
}

impl IntoResponse for FinishedResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.envelope)).into_response();
        response.headers_mut().extend(self.headers);
        response.extensions_mut().insert(Enveloped);
        response
    }
}

#[cfg(test)]
mod tests {
    use http::header::{CONTENT_TYPE, RETRY_AFTER};

    use super::*;

    fn envelope() -> ErrorEnvelope {
        ErrorEnvelope {
            error: true,
            error_id: "0a1b2c3d".to_owned(),
            error_type: "rate_limit_exceeded".to_owned(),
            message: "Request rate limit exceeded".to_owned(),
            code: "throttled".to_owned(),
            timestamp: "2026-01-01T00:00:00Z".to_owned(),
            path: None,
            method: None,
            details: None,
            help: None,
            retry_after: Some(5),
            allowed_methods: None,
        }
    }

    #[test]
    fn response_is_json_with_headers_and_marker() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, http::HeaderValue::from(5_u64));

        let response = FinishedResponse {
            status: StatusCode::TOO_MANY_REQUESTS,
            envelope: envelope(),
            headers,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()[RETRY_AFTER], "5");
        assert!(response.extensions().get::<Enveloped>().is_some());
    }
}
