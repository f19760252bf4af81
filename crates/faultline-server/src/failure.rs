use std::backtrace::Backtrace;

use axum::response::{IntoResponse, Response};
use faultline_core::{IntoFailure, RaisedFailure, ViewContext};
use http::StatusCode;

/// Handler error carrying a raised failure to the envelope middleware
///
/// The response it produces is a placeholder; the envelope middleware
/// replaces it with the pipeline's answer.
#[derive(Debug, Clone)]
pub struct Failure {
    raised: RaisedFailure,
    view: Option<ViewContext>,
}

impl Failure {
    /// Capture a domain error
    pub fn from_error<E: IntoFailure>(error: &E) -> Self {
        Self::from(error.to_failure())
    }

    /// Name the handler that raised the failure, for log enrichment
    #[must_use]
    pub fn in_view(mut self, view: ViewContext) -> Self {
        self.view = Some(view);
        self
    }

    pub const fn raised(&self) -> &RaisedFailure {
        &self.raised
    }
}

impl From<RaisedFailure> for Failure {
    /// Unrecognized failures without a stack get one captured here, in the
    /// handler that raised them
    fn from(raised: RaisedFailure) -> Self {
        let raised = if raised.lineage.is_empty() && raised.stack.is_none() {
            raised.with_stack(Backtrace::force_capture().to_string())
        } else {
            raised
        };
        Self { raised, view: None }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(self.raised);
        if let Some(view) = self.view {
            response.extensions_mut().insert(view);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_carries_failure_and_view() {
        let response = Failure::from(RaisedFailure::not_found())
            .in_view(ViewContext::new("posts", "retrieve"))
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.extensions().get::<RaisedFailure>().map(|f| f.type_name.as_str()),
            Some("NotFound")
        );
        assert_eq!(
            response.extensions().get::<ViewContext>(),
            Some(&ViewContext::new("posts", "retrieve"))
        );
    }

    #[inline(never)]
    fn aggregate_stats() -> Failure {
        RaisedFailure::unrecognized("ZeroDivisionError", "division by zero").into()
    }

    #[test]
    fn unrecognized_failure_records_where_it_was_raised() {
        let failure = aggregate_stats();
        let stack = failure.raised().stack.as_deref().unwrap();
        assert!(stack.contains("aggregate_stats"), "{stack}");

        let kept = Failure::from(RaisedFailure::unrecognized("Panic", "boom").with_stack("src/stats.rs:4:9"));
        assert_eq!(kept.raised().stack.as_deref(), Some("src/stats.rs:4:9"));

        assert!(Failure::from(RaisedFailure::not_found()).raised().stack.is_none());
    }

    #[test]
    fn domain_errors_convert_through_into_failure() {
        let error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let failure = Failure::from_error(&error);
        assert_eq!(failure.raised().type_name, "ParseError");
    }
}
