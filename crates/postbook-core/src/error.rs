//! Domain-level error types.

use thiserror::Error;

use crate::domain::PostId;
use crate::ports::StorageError;

/// Post store errors. None of them is fatal.
#[derive(Debug, Error)]
pub enum PostError {
    /// Rejected input; nothing was changed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The id does not name a live post.
    #[error("Post not found: {0}")]
    NotFound(PostId),

    /// The backend could not be read or written. In-memory state is still current.
    #[error("Persistence failed: {0}")]
    Persistence(#[from] StorageError),
}

impl PostError {
    pub fn empty_title() -> Self {
        PostError::Validation("Enter a title".to_string())
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            PostError::Validation(msg) => msg.clone(),
            PostError::NotFound(id) => format!("Post {id} no longer exists"),
            PostError::Persistence(_) => {
                "Changes could not be saved and may be lost when this session ends".to_string()
            }
        }
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, PostError::Persistence(_))
    }
}
