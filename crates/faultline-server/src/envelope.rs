//! Envelope middleware
//!
//! Every error response leaving the router is an envelope. Failures raised
//! by handlers run through the pipeline directly; error responses the
//! framework produced on its own (extractor rejections, unmatched routes,
//! wrong methods, caught panics) are re-wrapped.

use std::any::Any;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use faultline_core::{FailureTag, RaisedFailure, RequestContext, ViewContext};
use faultline_pipeline::{Enveloped, ExceptionPipeline, PartialResponse};
use http::header::{ALLOW, RETRY_AFTER};
use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;

use crate::failure::Failure;
use crate::panic_stack;
use crate::request_context::context_for;

/// Largest framework error body read back for re-wrapping
const PARTIAL_BODY_LIMIT: usize = 64 * 1024;

/// Middleware that replaces error responses with envelopes
pub async fn envelope_middleware(
    State(pipeline): State<Arc<ExceptionPipeline>>,
    request: Request,
    next: Next,
) -> Response {
    let outer_context = context_for(&request);

    let mut response = next.run(request).await;
    if response.extensions().get::<Enveloped>().is_some() {
        return response;
    }

    let context = response
        .extensions_mut()
        .remove::<RequestContext>()
        .unwrap_or(outer_context);
    let view = response.extensions_mut().remove::<ViewContext>().unwrap_or_default();

    if let Some(failure) = response.extensions_mut().remove::<RaisedFailure>() {
        return pipeline.handle(&failure, &view, &context).into_response();
    }

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let (parts, body) = response.into_parts();
    let partial = PartialResponse {
        status: parts.status,
        body: partial_body(body).await,
        headers: parts.headers,
    };
    let failure = failure_for_partial(&partial);

    pipeline.rewrap(&failure, &view, &context, &partial).into_response()
}

/// Framework body as JSON; plain text becomes `{"detail": text}`
async fn partial_body(body: Body) -> Value {
    let bytes = match http_body_util::Limited::new(body, PARTIAL_BODY_LIMIT).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::debug!(error = %e, "failed to read framework error body");
            Bytes::new()
        }
    };

    if bytes.is_empty() {
        return Value::Null;
    }

    serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(&bytes).trim().to_owned();
        serde_json::json!({ "detail": text })
    })
}

/// Reconstruct the failure behind a framework-produced status
pub fn failure_for_partial(partial: &PartialResponse) -> RaisedFailure {
    let detail = partial.detail().map_or_else(
        || partial.status.canonical_reason().unwrap_or("unknown status").to_owned(),
        ToOwned::to_owned,
    );

    match partial.status {
        StatusCode::BAD_REQUEST => RaisedFailure::parse_error(detail),
        StatusCode::UNAUTHORIZED => RaisedFailure::not_authenticated(),
        StatusCode::FORBIDDEN => RaisedFailure::permission_denied(),
        StatusCode::NOT_FOUND => RaisedFailure::http_404(),
        StatusCode::METHOD_NOT_ALLOWED => RaisedFailure::method_not_allowed(allowed_methods(&partial.headers)),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => RaisedFailure::unsupported_media_type(detail),
        StatusCode::UNPROCESSABLE_ENTITY => RaisedFailure::new("ValidationError", FailureTag::Validation),
        StatusCode::TOO_MANY_REQUESTS => RaisedFailure::throttled(retry_after(&partial.headers)),
        _ => RaisedFailure::unrecognized("HttpError", detail),
    }
}

fn allowed_methods(headers: &HeaderMap) -> Vec<String> {
    headers
        .get(ALLOW)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|method| !method.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Delay-seconds form of `Retry-After`; HTTP dates are ignored
fn retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Response for a handler panic, handed to the envelope middleware
#[allow(clippy::needless_pass_by_value)]
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_owned());

    let mut failure = RaisedFailure::unrecognized("Panic", message);
    if let Some(stack) = panic_stack::take() {
        failure = failure.with_stack(stack);
    }
    Failure::from(failure).into_response()
}
