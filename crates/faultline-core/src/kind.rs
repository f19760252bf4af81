use std::fmt;

/// Category a raised failure is classified into
///
/// Variants are declared in classification priority order. When a failure
/// satisfies more than one predicate, the earliest variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Request payload failed field-level validation
    ValidationError,
    /// Caller is known but lacks permission
    PermissionDenied,
    /// No credentials were presented
    NotAuthenticated,
    /// Credentials were presented but rejected
    AuthenticationFailed,
    /// Requested resource does not exist
    NotFound,
    /// HTTP method is not supported by the endpoint
    MethodNotAllowed,
    /// Caller exceeded a request rate limit
    RateLimited,
    /// Request body could not be parsed
    ParseError,
    /// Request content type is not accepted
    UnsupportedMediaType,
    /// Domain rule rejected the operation
    BusinessRuleError,
    /// Persistence layer rejected a write on a constraint
    IntegrityViolation(IntegrityKind),
    /// Anything the classifier does not recognize
    UnhandledError,
}

/// Sub-classification of persistence constraint violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegrityKind {
    /// Unique constraint violated
    DuplicateEntry,
    /// Foreign key constraint violated
    ForeignKeyViolation,
    /// Any other constraint (check, not-null, exclusion)
    Other,
}

impl FailureKind {
    /// Every kind, in classification priority order
    pub const ALL: [Self; 14] = [
        Self::ValidationError,
        Self::PermissionDenied,
        Self::NotAuthenticated,
        Self::AuthenticationFailed,
        Self::NotFound,
        Self::MethodNotAllowed,
        Self::RateLimited,
        Self::ParseError,
        Self::UnsupportedMediaType,
        Self::BusinessRuleError,
        Self::IntegrityViolation(IntegrityKind::DuplicateEntry),
        Self::IntegrityViolation(IntegrityKind::ForeignKeyViolation),
        Self::IntegrityViolation(IntegrityKind::Other),
        Self::UnhandledError,
    ];

    /// Snake-case name used in log records and metrics
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::PermissionDenied => "permission_denied",
            Self::NotAuthenticated => "not_authenticated",
            Self::AuthenticationFailed => "authentication_failed",
            Self::NotFound => "not_found",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::RateLimited => "rate_limited",
            Self::ParseError => "parse_error",
            Self::UnsupportedMediaType => "unsupported_media_type",
            Self::BusinessRuleError => "business_rule_error",
            Self::IntegrityViolation(_) => "integrity_violation",
            Self::UnhandledError => "unhandled_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntegrityViolation(sub) => write!(f, "{}/{}", self.as_str(), sub.as_str()),
            _ => f.write_str(self.as_str()),
        }
    }
}

impl IntegrityKind {
    /// Snake-case name of the sub-kind
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateEntry => "duplicate_entry",
            Self::ForeignKeyViolation => "foreign_key_violation",
            Self::Other => "other",
        }
    }
}
