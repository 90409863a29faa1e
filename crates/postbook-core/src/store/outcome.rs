//! Values returned by store operations.

use crate::domain::{Post, PostId};
use crate::error::PostError;
use crate::ports::StorageError;

/// A mutation that has been applied in memory.
///
/// `persist_error` is set when the backend write failed. The mutation still
/// stands; it will be written again with the next successful persist.
#[derive(Debug)]
pub struct Committed<T> {
    pub value: T,
    pub persist_error: Option<PostError>,
}

impl<T> Committed<T> {
    pub(crate) fn new(value: T, persist_error: Option<PostError>) -> Self {
        Self {
            value,
            persist_error,
        }
    }

    /// True when the change reached the backend.
    pub fn is_durable(&self) -> bool {
        self.persist_error.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Created,
    Updated,
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saved {
    pub post: Post,
    pub kind: SaveKind,
}

/// What the presentation layer should ask before a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    pub id: PostId,
    pub title: String,
    pub prompt: &'static str,
}

impl DeleteConfirmation {
    pub const PROMPT: &'static str = "Delete this post?";

    pub(crate) fn for_post(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            prompt: Self::PROMPT,
        }
    }
}

/// Where the loaded sequence came from.
#[derive(Debug)]
pub enum LoadStatus {
    /// The persisted entry was read.
    Loaded,
    /// Nothing was persisted under the key.
    Missing,
    /// The entry exists but is not a JSON array.
    Malformed { reason: String },
    /// The backend could not be read.
    Unavailable(StorageError),
}

/// Summary of a [`load`](super::PostStore::load).
#[derive(Debug)]
pub struct LoadReport {
    pub status: LoadStatus,
    pub loaded: usize,
    /// Records dropped because they were not valid posts.
    pub skipped: usize,
    /// Posts that were given a fresh id because theirs was already taken.
    pub reassigned: usize,
    /// Set when writing back reassigned ids failed.
    pub persist_error: Option<PostError>,
}

impl LoadReport {
    pub(crate) fn new(status: LoadStatus) -> Self {
        Self {
            status,
            loaded: 0,
            skipped: 0,
            reassigned: 0,
            persist_error: None,
        }
    }

    /// True when the store started empty because of a problem rather than
    /// because nothing had been saved yet.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self.status,
            LoadStatus::Malformed { .. } | LoadStatus::Unavailable(_)
        ) || self.persist_error.is_some()
    }
}
