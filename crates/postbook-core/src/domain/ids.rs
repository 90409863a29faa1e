//! Post id allocation.

use chrono::{DateTime, Utc};

use super::PostId;

/// Hands out post ids that are timestamp-shaped but strictly increasing.
///
/// The next id is `max(now_millis, last + 1)`, so ids stay compatible with
/// millisecond-timestamp ids already on disk while two posts created in the
/// same millisecond still get distinct ids.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an id that is already in use so it is never handed out again.
    pub fn observe(&mut self, id: PostId) {
        self.last = self.last.max(id.0);
    }

    /// The next id, or `None` once `u64::MAX` has been issued or observed.
    pub fn next_id(&mut self, now: DateTime<Utc>) -> Option<PostId> {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = millis.max(self.last.checked_add(1)?);
        self.last = id;
        Some(PostId(id))
    }
}
