//! # Postbook Infrastructure
//!
//! Concrete implementations of the ports defined in `postbook-core`.
//!
//! ## Feature Flags
//!
//! - `file` (default) - Directory-backed storage, one file per key
//! - `full` - All backends
//! - `minimal` - In-memory storage only
//! - `redis` - Redis-backed storage

pub mod storage;

// Re-exports - In-Memory
pub use storage::InMemoryStorage;

// Re-exports - File
#[cfg(feature = "file")]
pub use storage::{FileStorage, FileStorageConfig};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use storage::{RedisConfig, RedisStorage};
