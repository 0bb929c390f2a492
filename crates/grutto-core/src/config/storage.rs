//! Blob storage configuration.

use serde::{Deserialize, Serialize};

/// Which blob store implementation holds file contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobProvider {
    /// Files under a local directory.
    Local,
    /// Process-local map; data is lost on exit.
    Memory,
}

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Blob store implementation.
    #[serde(default = "default_provider")]
    pub provider: BlobProvider,
    /// Local filesystem storage configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,
    /// Signed read-URL configuration.
    #[serde(default)]
    pub signed_url: SignedUrlConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            local: LocalStorageConfig::default(),
            signed_url: SignedUrlConfig::default(),
        }
    }
}

/// Local filesystem storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Root path for local blob storage.
    #[serde(default = "default_local_root")]
    pub root_path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
        }
    }
}

/// Settings for short-lived read URLs handed to external viewers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedUrlConfig {
    /// Public base URL under which blobs are served.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Secret mixed into every signature.
    #[serde(default = "default_secret")]
    pub secret: String,
    /// Lifetime of an issued URL in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

impl Default for SignedUrlConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            secret: default_secret(),
            ttl_seconds: default_ttl(),
        }
    }
}

fn default_provider() -> BlobProvider {
    BlobProvider::Local
}

fn default_local_root() -> String {
    "./data/blobs".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080/blobs".to_string()
}

fn default_secret() -> String {
    "change-me".to_string()
}

fn default_ttl() -> u64 {
    60
}
