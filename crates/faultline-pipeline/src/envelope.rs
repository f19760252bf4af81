use faultline_config::Language;
use faultline_core::{FailureKind, FailureTag, IntegrityKind, RaisedFailure};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::correlation::CorrelationId;
use crate::details;
use crate::messages::Catalog;

/// Uniform JSON error body returned to callers
///
/// Optional fields are omitted when absent, never serialized as `null`.
/// `code` is stable across releases; `message` may be localized or
/// reworded and must not be branched on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always `true`
    pub error: bool,
    /// Correlation id shared with the log record
    pub error_id: String,
    pub error_type: String,
    pub message: String,
    pub code: String,
    /// RFC 3339 UTC time the envelope was built
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Normalized field errors, validation failures only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Seconds to wait, rate-limited failures only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    /// Accepted methods, method-not-allowed failures only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_methods: Option<Vec<String>>,
}

/// Status, `error_type` and default `code` for one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub status: StatusCode,
    pub error_type: &'static str,
    pub code: &'static str,
}

const fn row(status: StatusCode, error_type: &'static str, code: &'static str) -> Mapping {
    Mapping {
        status,
        error_type,
        code,
    }
}

/// The fixed mapping table
///
/// `BusinessRuleError` rows carry the fallback used when the failure
/// declares no status or code of its own.
pub const fn mapping(kind: FailureKind) -> Mapping {
    use FailureKind as K;
    use IntegrityKind as I;

    match kind {
        K::ValidationError => row(StatusCode::BAD_REQUEST, "validation_error", "validation_error"),
        K::PermissionDenied => row(StatusCode::FORBIDDEN, "permission_denied", "permission_denied"),
        K::NotAuthenticated => row(StatusCode::UNAUTHORIZED, "authentication_required", "not_authenticated"),
        K::AuthenticationFailed => row(StatusCode::UNAUTHORIZED, "authentication_failed", "authentication_failed"),
        K::NotFound => row(StatusCode::NOT_FOUND, "not_found", "not_found"),
        K::MethodNotAllowed => row(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", "method_not_allowed"),
        K::RateLimited => row(StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded", "throttled"),
        K::ParseError => row(StatusCode::BAD_REQUEST, "parse_error", "parse_error"),
        K::UnsupportedMediaType => row(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "unsupported_media_type",
            "unsupported_media_type",
        ),
        K::BusinessRuleError => row(StatusCode::INTERNAL_SERVER_ERROR, "business_error", "business_error"),
        K::IntegrityViolation(I::DuplicateEntry) => row(StatusCode::CONFLICT, "integrity_error", "duplicate_entry"),
        K::IntegrityViolation(I::ForeignKeyViolation) => {
            row(StatusCode::BAD_REQUEST, "integrity_error", "foreign_key_violation")
        }
        K::IntegrityViolation(I::Other) => row(StatusCode::BAD_REQUEST, "integrity_error", "integrity_error"),
        K::UnhandledError => row(StatusCode::INTERNAL_SERVER_ERROR, "server_error", "internal_server_error"),
    }
}

/// Error response a framework formatter already produced
#[derive(Debug, Clone)]
pub struct PartialResponse {
    pub status: StatusCode,
    /// Body as the framework rendered it; plain text arrives as `{"detail": text}`
    pub body: Value,
    pub headers: http::HeaderMap,
}

impl PartialResponse {
    /// `detail` string of the partial body, if it has one
    pub fn detail(&self) -> Option<&str> {
        self.body.get("detail").and_then(Value::as_str)
    }
}

/// Builds envelopes in the deployment's language
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeBuilder {
    catalog: Catalog,
}

impl EnvelopeBuilder {
    pub const fn new(language: Language) -> Self {
        Self {
            catalog: Catalog::new(language),
        }
    }

    /// Build the envelope and status for a classified failure
    pub fn build(
        &self,
        kind: FailureKind,
        failure: &RaisedFailure,
        error_id: &CorrelationId,
        path: Option<&str>,
        method: Option<&str>,
    ) -> (ErrorEnvelope, StatusCode) {
        let status = status_for(kind, failure);
        let envelope = self.envelope(kind, failure, error_id, path, method, None);
        (envelope, status)
    }

    /// Re-wrap a framework-produced response into the standard envelope
    ///
    /// The framework's status is kept and its body fills in what the
    /// failure itself lacks. An unclassified failure the framework still
    /// answered with a client error becomes a generic `api_error`.
    pub fn rewrap(
        &self,
        kind: FailureKind,
        failure: &RaisedFailure,
        error_id: &CorrelationId,
        path: Option<&str>,
        method: Option<&str>,
        partial: &PartialResponse,
    ) -> (ErrorEnvelope, StatusCode) {
        let mut envelope = self.envelope(kind, failure, error_id, path, method, Some(partial));

        if kind == FailureKind::UnhandledError && !partial.status.is_server_error() {
            envelope.error_type = "api_error".to_owned();
            envelope.code = failure.code.clone().unwrap_or_else(|| "api_error".to_owned());
            envelope.message = partial.detail().unwrap_or_else(|| self.catalog.api_error()).to_owned();
            envelope.help = None;
        }

        (envelope, partial.status)
    }

    /// Bare unhandled-error envelope, used when the pipeline itself faults
    pub fn minimal(&self, error_id: &CorrelationId, path: Option<&str>, method: Option<&str>) -> ErrorEnvelope {
        let row = mapping(FailureKind::UnhandledError);

        ErrorEnvelope {
            error: true,
            error_id: error_id.to_string(),
            error_type: row.error_type.to_owned(),
            message: self.catalog.message(FailureKind::UnhandledError).to_owned(),
            code: row.code.to_owned(),
            timestamp: jiff::Timestamp::now().to_string(),
            path: path.map(ToOwned::to_owned),
            method: method.map(ToOwned::to_owned),
            details: None,
            help: None,
            retry_after: None,
            allowed_methods: None,
        }
    }

    fn envelope(
        &self,
        kind: FailureKind,
        failure: &RaisedFailure,
        error_id: &CorrelationId,
        path: Option<&str>,
        method: Option<&str>,
        partial: Option<&PartialResponse>,
    ) -> ErrorEnvelope {
        let row = mapping(kind);

        ErrorEnvelope {
            error: true,
            error_id: error_id.to_string(),
            error_type: row.error_type.to_owned(),
            message: self.message(kind, failure, method, partial),
            code: code_for(kind, failure, row),
            timestamp: jiff::Timestamp::now().to_string(),
            path: path.map(ToOwned::to_owned),
            method: method.map(ToOwned::to_owned),
            details: (kind == FailureKind::ValidationError).then(|| validation_details(failure, partial)),
            help: self
                .catalog
                .help(kind, failure.retry_after())
                .map(std::borrow::Cow::into_owned),
            retry_after: if kind == FailureKind::RateLimited {
                failure.retry_after()
            } else {
                None
            },
            allowed_methods: (kind == FailureKind::MethodNotAllowed)
                .then(|| failure.allowed_methods().map(<[String]>::to_vec).unwrap_or_default()),
        }
    }

    fn message(
        &self,
        kind: FailureKind,
        failure: &RaisedFailure,
        method: Option<&str>,
        partial: Option<&PartialResponse>,
    ) -> String {
        match kind {
            FailureKind::PermissionDenied
            | FailureKind::AuthenticationFailed
            | FailureKind::NotFound
            | FailureKind::BusinessRuleError => failure
                .detail_str()
                .or_else(|| partial.and_then(PartialResponse::detail))
                .unwrap_or_else(|| self.catalog.message(kind))
                .to_owned(),
            FailureKind::MethodNotAllowed => method.map_or_else(
                || self.catalog.message(kind).to_owned(),
                |method| self.catalog.method_not_allowed(method),
            ),
            _ => self.catalog.message(kind).to_owned(),
        }
    }
}

fn status_for(kind: FailureKind, failure: &RaisedFailure) -> StatusCode {
    if kind == FailureKind::BusinessRuleError
        && let Some(declared) = failure.declared_status()
        && let Ok(status) = StatusCode::from_u16(declared)
        && (status.is_client_error() || status.is_server_error())
    {
        return status;
    }
    mapping(kind).status
}

fn code_for(kind: FailureKind, failure: &RaisedFailure, row: Mapping) -> String {
    match kind {
        FailureKind::BusinessRuleError => failure.code.clone().unwrap_or_else(|| row.code.to_owned()),
        FailureKind::ValidationError if !failure.is(FailureTag::Validation) && failure.is(FailureTag::ModelValidation) => {
            "model_validation_error".to_owned()
        }
        _ => row.code.to_owned(),
    }
}

/// Field errors from the failure, else from the framework body; an empty body has none
fn validation_details(failure: &RaisedFailure, partial: Option<&PartialResponse>) -> Value {
    let source = failure
        .detail
        .as_ref()
        .or_else(|| partial.map(|p| &p.body))
        .filter(|detail| !detail.is_null());
    source.map_or_else(|| Value::Object(serde_json::Map::new()), details::normalize)
}
