//! # Postbook Core
//!
//! The domain layer of Postbook.
//! This crate holds the post store and its rendering projection. Storage
//! backends plug in through the ports in [`ports`].

pub mod clock;
pub mod domain;
pub mod error;
pub mod ports;
pub mod render;
pub mod store;

pub use clock::{ManualClock, SystemClock};
pub use domain::{Post, PostId};
pub use error::PostError;
pub use render::{
    DisplayZone, HtmlSanitizer, Notice, NoticeLevel, PostListView, PostView, Sanitizer,
    TerminalSanitizer,
};
pub use store::{
    Committed, DeleteConfirmation, LoadReport, LoadStatus, PostStore, SaveKind, Saved,
    StoreConfig,
};
