//! Key-value storage implementations - in-memory, local files and Redis.

mod memory;

#[cfg(feature = "file")]
mod file;

#[cfg(feature = "redis")]
mod redis;

pub use memory::InMemoryStorage;

#[cfg(feature = "file")]
pub use file::{FileStorage, FileStorageConfig};

#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisStorage};
