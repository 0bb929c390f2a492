//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field carries a serde default so that a missing
//! file still yields a usable configuration.

pub mod database;
pub mod logging;
pub mod notification;
pub mod sharing;
pub mod storage;
pub mod upload;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::database::{DatabaseBackend, DatabaseConfig};
pub use self::logging::LoggingConfig;
pub use self::notification::NotificationConfig;
pub use self::sharing::SharingConfig;
pub use self::storage::{BlobProvider, LocalStorageConfig, SignedUrlConfig, StorageConfig};
pub use self::upload::UploadConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Row-store connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blob storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upload validation and pipeline settings.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Notification retention settings.
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Recipient search settings.
    #[serde(default)]
    pub sharing: SharingConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with `config/{env}.toml` and
    /// environment variables prefixed with `GRUTTO__` (sections separated
    /// by `__`, e.g. `GRUTTO__DATABASE__URL`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config/default", env)
    }

    /// Load configuration starting from an explicit base file path.
    pub fn load_from(base: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("GRUTTO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_yields_defaults() {
        let config: AppConfig = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.upload.max_file_size_bytes, 52_428_800);
        assert_eq!(config.upload.allowed_mime_types.len(), 7);
        assert_eq!(config.notifications.retention_days, 30);
        assert_eq!(config.sharing.user_search_limit, 10);
        assert_eq!(config.database.backend, DatabaseBackend::Postgres);
        assert_eq!(config.storage.provider, BlobProvider::Local);
    }

    #[test]
    fn test_toml_overrides() {
        let toml = r#"
            [database]
            backend = "memory"

            [upload]
            concurrency = 8

            [storage]
            provider = "memory"

            [storage.signed_url]
            ttl_seconds = 120
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.database.backend, DatabaseBackend::Memory);
        assert_eq!(config.upload.concurrency, 8);
        assert_eq!(config.upload.max_file_size_bytes, 52_428_800);
        assert_eq!(config.storage.provider, BlobProvider::Memory);
        assert_eq!(config.storage.signed_url.ttl_seconds, 120);
    }
}
