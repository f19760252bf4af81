//! Failure classification
//!
//! An ordered rule chain evaluated top to bottom; the first rule whose
//! predicate matches decides the kind. Order encodes subtype priority: a
//! failure tagged both `BusinessRule` and `PermissionDenied` is a
//! permission denial.

use faultline_core::{FailureKind, FailureTag, IntegrityKind, RaisedFailure};

/// SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for `foreign_key_violation`
const FOREIGN_KEY_VIOLATION: &str = "23503";

enum Outcome {
    Kind(FailureKind),
    Integrity,
}

struct Rule {
    matches: fn(&RaisedFailure) -> bool,
    outcome: Outcome,
}

const RULES: [Rule; 11] = [
    Rule {
        matches: is_validation,
        outcome: Outcome::Kind(FailureKind::ValidationError),
    },
    Rule {
        matches: |f| f.is(FailureTag::PermissionDenied),
        outcome: Outcome::Kind(FailureKind::PermissionDenied),
    },
    Rule {
        matches: |f| f.is(FailureTag::NotAuthenticated),
        outcome: Outcome::Kind(FailureKind::NotAuthenticated),
    },
    Rule {
        matches: |f| f.is(FailureTag::AuthenticationFailed),
        outcome: Outcome::Kind(FailureKind::AuthenticationFailed),
    },
    Rule {
        matches: |f| f.is(FailureTag::NotFound) || f.is(FailureTag::Http404),
        outcome: Outcome::Kind(FailureKind::NotFound),
    },
    Rule {
        matches: |f| f.is(FailureTag::MethodNotAllowed),
        outcome: Outcome::Kind(FailureKind::MethodNotAllowed),
    },
    Rule {
        matches: |f| f.is(FailureTag::Throttled),
        outcome: Outcome::Kind(FailureKind::RateLimited),
    },
    Rule {
        matches: |f| f.is(FailureTag::Parse),
        outcome: Outcome::Kind(FailureKind::ParseError),
    },
    Rule {
        matches: |f| f.is(FailureTag::UnsupportedMediaType),
        outcome: Outcome::Kind(FailureKind::UnsupportedMediaType),
    },
    Rule {
        matches: |f| f.is(FailureTag::BusinessRule),
        outcome: Outcome::Kind(FailureKind::BusinessRuleError),
    },
    Rule {
        matches: |f| f.is(FailureTag::Integrity),
        outcome: Outcome::Integrity,
    },
];

fn is_validation(failure: &RaisedFailure) -> bool {
    failure.is(FailureTag::Validation) || failure.is(FailureTag::ModelValidation)
}

/// Map a raised failure to its kind
///
/// Total and side-effect free. Anything no rule matches is
/// [`FailureKind::UnhandledError`].
pub fn classify(failure: &RaisedFailure) -> FailureKind {
    RULES
        .iter()
        .find(|rule| (rule.matches)(failure))
        .map_or(FailureKind::UnhandledError, |rule| match rule.outcome {
            Outcome::Kind(kind) => kind,
            Outcome::Integrity => FailureKind::IntegrityViolation(integrity_kind(failure)),
        })
}

/// Sub-classify a constraint violation
///
/// A SQLSTATE from the persistence layer is authoritative. Without one,
/// the driver's message is searched for English keywords, which is
/// locale- and driver-dependent.
pub fn integrity_kind(failure: &RaisedFailure) -> IntegrityKind {
    if let Some(state) = failure.sqlstate() {
        return match state {
            UNIQUE_VIOLATION => IntegrityKind::DuplicateEntry,
            FOREIGN_KEY_VIOLATION => IntegrityKind::ForeignKeyViolation,
            _ => IntegrityKind::Other,
        };
    }

    let text = failure.describe().to_lowercase();
    if text.contains("unique") || text.contains("duplicate") {
        IntegrityKind::DuplicateEntry
    } else if text.contains("foreign key") {
        IntegrityKind::ForeignKeyViolation
    } else {
        IntegrityKind::Other
    }
}
