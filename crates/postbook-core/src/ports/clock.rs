use chrono::{DateTime, Utc};

/// Source of "now" for post timestamps and id allocation.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
