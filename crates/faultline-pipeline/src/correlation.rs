use std::fmt;

use uuid::Uuid;

const LEN: usize = 8;

/// Short identifier linking an error envelope to its log record
///
/// Eight lowercase hex characters taken from a random UUID. Unique enough
/// to correlate logs within a retention window; not an idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Issue a fresh identifier
    pub fn issue() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(LEN);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CorrelationId> for String {
    fn from(id: CorrelationId) -> Self {
        id.0
    }
}
