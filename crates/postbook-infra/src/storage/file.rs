//! File-backed storage - one JSON file per key under a data directory.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use postbook_core::ports::{KeyValueStore, StorageError};

const EXTENSION: &str = "json";

/// File storage configuration.
#[derive(Debug, Clone)]
pub struct FileStorageConfig {
    /// Directory holding one file per key.
    pub data_dir: PathBuf,
    /// Optional limit on the total size of all stored values, in bytes.
    pub quota_bytes: Option<usize>,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            quota_bytes: None,
        }
    }
}

impl FileStorageConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("POSTBOOK_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            quota_bytes: std::env::var("POSTBOOK_QUOTA_BYTES")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }
}

/// Stores each key as `<data_dir>/<key>.json`.
///
/// Writes go to a temporary file that is then renamed over the target, so a
/// reader sees either the old value or the new one.
pub struct FileStorage {
    root: PathBuf,
    quota: Option<usize>,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Open (and create if needed) the data directory.
    pub fn new(config: FileStorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir).map_err(|e| {
            StorageError::Unavailable(format!(
                "cannot create data directory {}: {e}",
                config.data_dir.display()
            ))
        })?;

        tracing::info!(dir = %config.data_dir.display(), "Opened file storage");

        Ok(Self {
            root: config.data_dir,
            quota: config.quota_bytes,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.{EXTENSION}")))
    }

    /// Total size of stored values, skipping `except`.
    fn used_bytes(&self, except: &Path) -> io::Result<usize> {
        let mut total = 0;
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path == except || path.extension().is_none_or(|ext| ext != EXTENSION) {
                continue;
            }
            let len = fs::metadata(&path)?.len();
            total += usize::try_from(len).unwrap_or(usize::MAX);
        }
        Ok(total)
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "File storage read failed");
                Err(e.into())
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();

        if let Some(limit) = self.quota {
            let required = self.used_bytes(&path)?.saturating_add(value.len());
            if required > limit {
                tracing::warn!(key = %key, required, limit, "Storage quota exceeded");
                return Err(StorageError::QuotaExceeded { required, limit });
            }
        }

        let tmp = self.root.join(format!(".{key}.{EXTENSION}.tmp"));
        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(value.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            tracing::warn!(path = %path.display(), error = %e, "File storage write failed");
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), bytes = value.len(), "Value written");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
