//! Redis storage implementation.

use std::time::Duration;

use parking_lot::Mutex;
use redis::{Client, Commands, Connection};

use postbook_core::ports::{KeyValueStore, StorageError};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Prefix prepended to every key, so several stores can share a database.
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            key_prefix: "postbook:".to_string(),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            key_prefix: std::env::var("REDIS_KEY_PREFIX")
                .unwrap_or_else(|_| "postbook:".to_string()),
        }
    }

    /// The Redis key a store key is kept under.
    pub fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

/// Redis-backed storage over a single blocking connection.
pub struct RedisStorage {
    conn: Mutex<Connection>,
    config: RedisConfig,
}

impl RedisStorage {
    pub fn new(config: RedisConfig) -> Result<Self, StorageError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let conn = client
            .get_connection_with_timeout(config.connect_timeout)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis storage");

        Ok(Self {
            conn: Mutex::new(conn),
            config,
        })
    }
}

impl KeyValueStore for RedisStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let key = self.config.full_key(key);
        self.conn
            .lock()
            .get::<_, Option<String>>(&key)
            .map_err(|e| {
                tracing::warn!(key = %key, error = %e, "Redis GET failed");
                StorageError::Operation(e.to_string())
            })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let key = self.config.full_key(key);
        self.conn
            .lock()
            .set::<_, _, ()>(&key, value)
            .map_err(|e| {
                tracing::warn!(key = %key, error = %e, "Redis SET failed");
                StorageError::Operation(e.to_string())
            })
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let key = self.config.full_key(key);
        self.conn
            .lock()
            .del::<_, ()>(&key)
            .map_err(|e| StorageError::Operation(e.to_string()))
    }

    fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let key = self.config.full_key(key);
        self.conn
            .lock()
            .exists::<_, bool>(&key)
            .map_err(|e| StorageError::Operation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_storage() -> Option<RedisStorage> {
        let config = RedisConfig {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6389".to_string()),
            connect_timeout: Duration::from_secs(1),
            key_prefix: "postbook-test:".to_string(),
        };

        RedisStorage::new(config).ok()
    }

    #[test]
    fn test_redis_storage_set_get() {
        let storage = match get_test_storage() {
            Some(s) => s,
            None => {
                tracing::warn!("Redis not available, skipping test");
                return;
            }
        };

        storage.set("posts", "[]").unwrap();
        assert_eq!(storage.get("posts").unwrap(), Some("[]".to_string()));
        assert!(storage.exists("posts").unwrap());

        storage.delete("posts").unwrap();
        assert_eq!(storage.get("posts").unwrap(), None);
    }

    #[test]
    fn test_key_prefix_is_applied() {
        let config = RedisConfig {
            key_prefix: "postbook-test:".to_string(),
            ..RedisConfig::default()
        };
        assert_eq!(config.full_key("posts"), "postbook-test:posts");
        assert_eq!(RedisConfig::default().full_key("posts"), "postbook:posts");
    }
}
