/// Key-value storage trait - abstraction over persistence backends
/// (in-memory, local files, Redis).
///
/// Calls are synchronous: a successful `set` is durable when it returns.
pub trait KeyValueStore: Send + Sync {
    /// Get a value. `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.get(key).map(|value| value.is_some())
    }
}

/// Storage operation errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage quota exceeded: {required} bytes required, limit is {limit}")]
    QuotaExceeded { required: usize, limit: usize },

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}
