use chrono::{DateTime, Utc};

/// Port supplying the current UTC instant.
///
/// Implementations should be monotonic so that audit timestamps follow
/// sequence order; chain validity does not depend on it.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}
