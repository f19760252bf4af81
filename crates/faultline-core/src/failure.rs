use serde_json::Value;

/// Structural tag naming what a failure is
///
/// A failure carries the tag of its own type plus the tags of every type it
/// specializes, so a custom denial raised by domain code can be both
/// [`FailureTag::BusinessRule`] and [`FailureTag::PermissionDenied`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureTag {
    /// Field-level validation raised by the API layer
    Validation,
    /// Validation raised by the model layer
    ModelValidation,
    /// Authenticated caller lacks permission
    PermissionDenied,
    /// No credentials presented
    NotAuthenticated,
    /// Credentials rejected
    AuthenticationFailed,
    /// Lookup by the API layer found nothing
    NotFound,
    /// Framework-level 404 (no route, or object lookup shortcut)
    Http404,
    /// Method not supported by the endpoint
    MethodNotAllowed,
    /// Request throttled
    Throttled,
    /// Malformed request body
    Parse,
    /// Content type not accepted
    UnsupportedMediaType,
    /// Domain rule violation declared by application code
    BusinessRule,
    /// Persistence constraint violation
    Integrity,
}

/// Kind-specific auxiliary data attached to a failure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Auxiliary {
    /// Nothing attached
    #[default]
    None,
    /// Seconds the caller should wait before retrying
    RetryAfter(u64),
    /// Methods the endpoint does accept
    AllowedMethods(Vec<String>),
    /// HTTP status declared by the raising code
    DeclaredStatus(u16),
    /// SQLSTATE reported by the persistence layer
    SqlState(String),
}

/// A failure entering the pipeline, however it originated
///
/// Owned by the layer that detected the failure. The pipeline only ever
/// borrows it.
#[derive(Debug, Clone, Default)]
pub struct RaisedFailure {
    /// Internal type identifier (e.g. `IntegrityError`, `ZeroDivisionError`)
    pub type_name: String,
    /// Tags of the failure's type and its ancestors, most specific first
    pub lineage: Vec<FailureTag>,
    /// Caller-facing detail: a string, or a mapping of field to messages
    pub detail: Option<Value>,
    /// Raw text rendered by the raising layer; may contain internals
    pub message: Option<String>,
    /// Machine code declared by the raising layer
    pub code: Option<String>,
    /// Kind-specific auxiliary data
    pub aux: Auxiliary,
    /// Stack captured where the failure was raised, when the raiser had one
    pub stack: Option<String>,
}

impl RaisedFailure {
    /// Create a failure with a type name and its most specific tag
    pub fn new(type_name: impl Into<String>, tag: FailureTag) -> Self {
        Self {
            type_name: type_name.into(),
            lineage: vec![tag],
            ..Self::default()
        }
    }

    /// Create a failure no predicate knows about
    pub fn unrecognized(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Field validation failure with a detail mapping (or list, or string)
    pub fn validation(detail: impl Into<Value>) -> Self {
        Self::new("ValidationError", FailureTag::Validation).with_detail(detail)
    }

    /// Validation raised by the model layer rather than the API layer
    pub fn model_validation(detail: impl Into<Value>) -> Self {
        Self::new("ModelValidationError", FailureTag::ModelValidation).with_detail(detail)
    }

    /// Authenticated caller lacks permission
    pub fn permission_denied() -> Self {
        Self::new("PermissionDenied", FailureTag::PermissionDenied)
    }

    /// No credentials were presented
    pub fn not_authenticated() -> Self {
        Self::new("NotAuthenticated", FailureTag::NotAuthenticated)
    }

    /// Presented credentials were rejected
    pub fn authentication_failed() -> Self {
        Self::new("AuthenticationFailed", FailureTag::AuthenticationFailed)
    }

    /// API-level lookup found nothing
    pub fn not_found() -> Self {
        Self::new("NotFound", FailureTag::NotFound)
    }

    /// Framework-level 404
    pub fn http_404() -> Self {
        Self::new("Http404", FailureTag::Http404)
    }

    /// Method not supported; `allowed` lists the methods that are
    pub fn method_not_allowed<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("MethodNotAllowed", FailureTag::MethodNotAllowed)
            .with_aux(Auxiliary::AllowedMethods(allowed.into_iter().map(Into::into).collect()))
    }

    /// Request throttled, with the wait in seconds when known
    pub fn throttled(wait: Option<u64>) -> Self {
        let failure = Self::new("Throttled", FailureTag::Throttled);
        match wait {
            Some(seconds) => failure.with_aux(Auxiliary::RetryAfter(seconds)),
            None => failure,
        }
    }

    /// Request body could not be parsed
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new("ParseError", FailureTag::Parse).with_message(message)
    }

    /// Content type not accepted
    pub fn unsupported_media_type(media_type: impl Into<String>) -> Self {
        Self::new("UnsupportedMediaType", FailureTag::UnsupportedMediaType).with_message(media_type)
    }

    /// Domain rule violation with its own caller-facing detail
    pub fn business_rule(detail: impl Into<String>) -> Self {
        Self::new("BusinessRuleError", FailureTag::BusinessRule).with_detail(Value::String(detail.into()))
    }

    /// Persistence constraint violation carrying the driver's message
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new("IntegrityError", FailureTag::Integrity).with_message(message)
    }

    /// Attach a caller-facing detail
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<Value>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach the raw failure text
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach a machine code
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach auxiliary data
    #[must_use]
    pub fn with_aux(mut self, aux: Auxiliary) -> Self {
        self.aux = aux;
        self
    }

    /// Attach a stack captured at the raise site
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Declare the HTTP status the raising code wants
    #[must_use]
    pub fn with_status(self, status: u16) -> Self {
        self.with_aux(Auxiliary::DeclaredStatus(status))
    }

    /// Attach a SQLSTATE reported by the persistence layer
    #[must_use]
    pub fn with_sqlstate(self, sqlstate: impl Into<String>) -> Self {
        self.with_aux(Auxiliary::SqlState(sqlstate.into()))
    }

    /// Add an ancestor tag
    #[must_use]
    pub fn also(mut self, tag: FailureTag) -> Self {
        if !self.lineage.contains(&tag) {
            self.lineage.push(tag);
        }
        self
    }

    /// Whether the failure's type is or specializes `tag`
    pub fn is(&self, tag: FailureTag) -> bool {
        self.lineage.contains(&tag)
    }

    /// Detail when it is a plain string
    pub fn detail_str(&self) -> Option<&str> {
        self.detail.as_ref().and_then(Value::as_str)
    }

    /// Text describing the failure for logs, preferring the raw message
    pub fn describe(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        match &self.detail {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => self.type_name.clone(),
        }
    }

    pub const fn retry_after(&self) -> Option<u64> {
        match self.aux {
            Auxiliary::RetryAfter(seconds) => Some(seconds),
            _ => None,
        }
    }

    pub fn allowed_methods(&self) -> Option<&[String]> {
        match &self.aux {
            Auxiliary::AllowedMethods(methods) => Some(methods),
            _ => None,
        }
    }

    pub const fn declared_status(&self) -> Option<u16> {
        match self.aux {
            Auxiliary::DeclaredStatus(status) => Some(status),
            _ => None,
        }
    }

    pub fn sqlstate(&self) -> Option<&str> {
        match &self.aux {
            Auxiliary::SqlState(state) => Some(state),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn lineage_accumulates_without_duplicates() {
        let failure = RaisedFailure::business_rule("not yours")
            .also(FailureTag::PermissionDenied)
            .also(FailureTag::PermissionDenied);

        assert_eq!(failure.lineage, vec![FailureTag::BusinessRule, FailureTag::PermissionDenied]);
        assert!(failure.is(FailureTag::PermissionDenied));
        assert!(!failure.is(FailureTag::Integrity));
    }

    #[test]
    fn throttled_without_wait_has_no_retry_after() {
        assert_eq!(RaisedFailure::throttled(None).retry_after(), None);
        assert_eq!(RaisedFailure::throttled(Some(30)).retry_after(), Some(30));
    }

    #[test]
    fn describe_prefers_raw_message() {
        let failure = RaisedFailure::integrity("duplicate key value").with_detail("conflict");
        assert_eq!(failure.describe(), "duplicate key value");

        let failure = RaisedFailure::validation(json!({"title": ["required"]}));
        assert_eq!(failure.describe(), r#"{"title":["required"]}"#);

        assert_eq!(RaisedFailure::permission_denied().describe(), "PermissionDenied");
    }

    #[test]
    fn auxiliary_accessors_only_match_their_variant() {
        let failure = RaisedFailure::method_not_allowed(["GET", "HEAD"]);
        assert_eq!(failure.allowed_methods(), Some(&["GET".to_owned(), "HEAD".to_owned()][..]));
        assert_eq!(failure.retry_after(), None);
        assert_eq!(failure.declared_status(), None);
        assert_eq!(failure.sqlstate(), None);
    }
}
