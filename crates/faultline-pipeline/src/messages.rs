//! Caller-facing message catalog
//!
//! `message` and `help` are localized; `code` and `error_type` never are.

use std::borrow::Cow;

use faultline_config::Language;
use faultline_core::{FailureKind, IntegrityKind};

/// Messages for one deployment language
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    language: Language,
}

impl Catalog {
    pub const fn new(language: Language) -> Self {
        Self { language }
    }

    /// Default message for a kind
    pub const fn message(self, kind: FailureKind) -> &'static str {
        use FailureKind as K;
        use IntegrityKind as I;

        match self.language {
            Language::En => match kind {
                K::ValidationError => "Request data failed validation",
                K::PermissionDenied => "You do not have permission to perform this action",
                K::NotAuthenticated => "Authentication credentials were not provided",
                K::AuthenticationFailed => "Authentication failed",
                K::NotFound => "The requested resource was not found",
                K::MethodNotAllowed => "Method not allowed",
                K::RateLimited => "Request rate limit exceeded",
                K::ParseError => "Malformed request data",
                K::UnsupportedMediaType => "Unsupported content type",
                K::BusinessRuleError => "The operation violates a business rule",
                K::IntegrityViolation(I::DuplicateEntry) => "An object with this data already exists",
                K::IntegrityViolation(I::ForeignKeyViolation) => "The operation breaks a relationship between objects",
                K::IntegrityViolation(I::Other) => "Data integrity violation",
                K::UnhandledError => "Internal server error",
            },
            Language::Ru => match kind {
                K::ValidationError => "Ошибка валидации данных",
                K::PermissionDenied => "Доступ запрещен",
                K::NotAuthenticated => "Требуется аутентификация",
                K::AuthenticationFailed => "Ошибка аутентификации",
                K::NotFound => "Ресурс не найден",
                K::MethodNotAllowed => "Метод не разрешен",
                K::RateLimited => "Превышен лимит запросов",
                K::ParseError => "Ошибка парсинга данных",
                K::UnsupportedMediaType => "Неподдерживаемый тип контента",
                K::BusinessRuleError => "Операция нарушает бизнес-правило",
                K::IntegrityViolation(I::DuplicateEntry) => "Объект с такими данными уже существует",
                K::IntegrityViolation(I::ForeignKeyViolation) => "Нарушение связей между объектами",
                K::IntegrityViolation(I::Other) => "Нарушение целостности данных",
                K::UnhandledError => "Внутренняя ошибка сервера",
            },
        }
    }

    /// Message naming the rejected method
    pub fn method_not_allowed(self, method: &str) -> String {
        match self.language {
            Language::En => format!("Method {method} is not allowed"),
            Language::Ru => format!("Метод {method} не разрешен"),
        }
    }

    /// Message for a framework-recognized failure outside the known kinds
    pub const fn api_error(self) -> &'static str {
        match self.language {
            Language::En => "An API error occurred",
            Language::Ru => "Произошла ошибка API",
        }
    }

    /// Actionable hint, for kinds that have one
    pub fn help(self, kind: FailureKind, retry_after: Option<u64>) -> Option<Cow<'static, str>> {
        use FailureKind as K;

        let hint = match (self.language, kind) {
            (
                _,
                K::ValidationError | K::MethodNotAllowed | K::BusinessRuleError | K::UnhandledError,
            ) => return None,
            (_, K::RateLimited) => return Some(self.retry_hint(retry_after)),
            (Language::En, K::PermissionDenied) => "Check your access rights or sign in",
            (Language::En, K::NotAuthenticated) => "Provide a valid authentication token",
            (Language::En, K::AuthenticationFailed) => "Check that your credentials are correct",
            (Language::En, K::NotFound) => "Check the URL and request parameters",
            (Language::En, K::ParseError) => "Check the format of the submitted data",
            (Language::En, K::UnsupportedMediaType) => "Check the Content-Type header",
            (Language::En, K::IntegrityViolation(_)) => "Check data uniqueness and the correctness of references",
            (Language::Ru, K::PermissionDenied) => "Проверьте права доступа или войдите в систему",
            (Language::Ru, K::NotAuthenticated) => "Передайте действительный токен аутентификации",
            (Language::Ru, K::AuthenticationFailed) => "Проверьте корректность учетных данных",
            (Language::Ru, K::NotFound) => "Проверьте правильность URL и параметров запроса",
            (Language::Ru, K::ParseError) => "Проверьте формат передаваемых данных",
            (Language::Ru, K::UnsupportedMediaType) => "Проверьте заголовок Content-Type",
            (Language::Ru, K::IntegrityViolation(_)) => "Проверьте уникальность данных и корректность ссылок",
        };

        Some(Cow::Borrowed(hint))
    }

    fn retry_hint(self, retry_after: Option<u64>) -> Cow<'static, str> {
        match (self.language, retry_after) {
            (Language::En, Some(seconds)) => Cow::Owned(format!("Retry the request in {seconds} seconds")),
            (Language::En, None) => Cow::Borrowed("Retry the request later"),
            (Language::Ru, Some(seconds)) => Cow::Owned(format!("Повторите запрос через {seconds} секунд")),
            (Language::Ru, None) => Cow::Borrowed("Повторите запрос позже"),
        }
    }
}
