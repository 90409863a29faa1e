//! Domain entities - the core business objects.

mod ids;
mod post;

pub use ids::IdAllocator;
pub use post::{Post, PostId, trim_text};
