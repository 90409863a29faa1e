//! Application configuration loaded from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;

use postbook_core::StoreConfig;
#[cfg(feature = "file")]
use postbook_infra::FileStorageConfig;
#[cfg(feature = "redis")]
use postbook_infra::RedisConfig;

/// Which storage backend holds the posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    File,
    Redis,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(Backend::Memory),
            "file" | "fs" => Ok(Backend::File),
            "redis" => Ok(Backend::Redis),
            other => Err(format!("unknown backend {other:?}")),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Memory => f.write_str("memory"),
            Backend::File => f.write_str("file"),
            Backend::Redis => f.write_str("redis"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: Backend,
    pub store: StoreConfig,
    #[cfg(feature = "file")]
    pub file: FileStorageConfig,
    #[cfg(feature = "redis")]
    pub redis: RedisConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let backend = match env::var("POSTBOOK_BACKEND") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Invalid POSTBOOK_BACKEND, using default");
                Self::default_backend()
            }),
            Err(_) => Self::default_backend(),
        };

        Self {
            backend,
            store: StoreConfig::from_env(),
            #[cfg(feature = "file")]
            file: FileStorageConfig::from_env(),
            #[cfg(feature = "redis")]
            redis: RedisConfig::from_env(),
        }
    }

    fn default_backend() -> Backend {
        if cfg!(feature = "file") {
            Backend::File
        } else {
            Backend::Memory
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!(" File ".parse::<Backend>().unwrap(), Backend::File);
        assert_eq!("mem".parse::<Backend>().unwrap(), Backend::Memory);
        assert_eq!("REDIS".parse::<Backend>().unwrap(), Backend::Redis);
        assert!("sqlite".parse::<Backend>().is_err());
    }

    #[test]
    fn test_backend_display_round_trips() {
        for backend in [Backend::Memory, Backend::File, Backend::Redis] {
            assert_eq!(backend.to_string().parse::<Backend>().unwrap(), backend);
        }
    }
}
