//! Application state - the post store wired to its storage backend.

use std::sync::Arc;

use postbook_core::ports::KeyValueStore;
use postbook_core::{LoadReport, PostStore};
use postbook_infra::InMemoryStorage;

use crate::config::{AppConfig, Backend};

/// Everything the console needs for one session.
pub struct AppState {
    pub store: PostStore,
    pub load_report: LoadReport,
    /// The backend actually in use; differs from the configured one after a fallback.
    pub backend: Backend,
}

impl AppState {
    /// Open the configured backend and load the posts.
    ///
    /// If the backend cannot be opened the session runs on in-memory storage
    /// instead, and nothing written will outlive the process.
    pub fn new(config: &AppConfig) -> Self {
        let (storage, backend) = open_storage(config);
        let (store, load_report) = PostStore::open(storage, config.store.clone());

        tracing::info!(backend = %backend, posts = store.len(), "Application state initialized");

        Self {
            store,
            load_report,
            backend,
        }
    }
}

fn open_storage(config: &AppConfig) -> (Arc<dyn KeyValueStore>, Backend) {
    match config.backend {
        Backend::Memory => {
            tracing::info!("Using in-memory storage; posts will not be kept");
            (Arc::new(InMemoryStorage::new()), Backend::Memory)
        }

        #[cfg(feature = "file")]
        Backend::File => match postbook_infra::FileStorage::new(config.file.clone()) {
            Ok(storage) => (Arc::new(storage), Backend::File),
            Err(e) => {
                tracing::error!(error = %e, "Failed to open file storage. Using in-memory fallback.");
                (Arc::new(InMemoryStorage::new()), Backend::Memory)
            }
        },

        #[cfg(feature = "redis")]
        Backend::Redis => match postbook_infra::RedisStorage::new(config.redis.clone()) {
            Ok(storage) => (Arc::new(storage), Backend::Redis),
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to Redis. Using in-memory fallback.");
                (Arc::new(InMemoryStorage::new()), Backend::Memory)
            }
        },

        #[allow(unreachable_patterns)]
        other => {
            tracing::warn!(backend = %other, "Backend not compiled in. Using in-memory storage.");
            (Arc::new(InMemoryStorage::new()), Backend::Memory)
        }
    }
}

#[cfg(all(test, feature = "file"))]
mod tests {
    use super::*;
    use postbook_core::StoreConfig;
    use postbook_infra::FileStorageConfig;
    use tempfile::TempDir;

    fn file_config(dir: &TempDir) -> AppConfig {
        AppConfig {
            backend: Backend::File,
            store: StoreConfig::default(),
            file: FileStorageConfig {
                data_dir: dir.path().to_path_buf(),
                quota_bytes: None,
            },
            #[cfg(feature = "redis")]
            redis: postbook_infra::RedisConfig::default(),
        }
    }

    #[test]
    fn test_posts_survive_a_new_session() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir);

        let mut first = AppState::new(&config);
        assert_eq!(first.backend, Backend::File);
        first.store.save("Kept", "across sessions", true).unwrap();

        let second = AppState::new(&config);
        assert_eq!(second.store.len(), 1);
        assert_eq!(second.store.posts()[0].title, "Kept");
        assert!(second.store.posts()[0].published);
    }

    #[test]
    fn test_unusable_data_dir_falls_back_to_memory() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file in the way").unwrap();

        let mut config = file_config(&dir);
        config.file.data_dir = blocker.join("data");

        let state = AppState::new(&config);
        assert_eq!(state.backend, Backend::Memory);
        assert!(state.store.is_empty());
    }
}
