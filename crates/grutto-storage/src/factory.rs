//! Builds the configured blob store.

use std::sync::Arc;

use tracing::info;

use grutto_core::config::{BlobProvider, StorageConfig};
use grutto_core::result::AppResult;
use grutto_core::traits::BlobStore;

use crate::providers::{LocalBlobStore, MemoryBlobStore};
use crate::signed::SignedUrlIssuer;

/// Create the blob store selected by `storage.provider`.
pub async fn build_blob_store(config: &StorageConfig) -> AppResult<Arc<dyn BlobStore>> {
    let issuer = SignedUrlIssuer::new(&config.signed_url);
    let store: Arc<dyn BlobStore> = match config.provider {
        BlobProvider::Local => {
            Arc::new(LocalBlobStore::new(&config.local.root_path, issuer).await?)
        }
        BlobProvider::Memory => Arc::new(MemoryBlobStore::new(issuer)),
    };
    info!(provider = store.provider_type(), "Blob store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builds_local_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StorageConfig::default();
        config.local.root_path = dir.path().join("blobs").to_string_lossy().to_string();

        let store = build_blob_store(&config).await.unwrap();
        assert_eq!(store.provider_type(), "local");
        assert!(store.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_builds_memory_store() {
        let config = StorageConfig {
            provider: BlobProvider::Memory,
            ..StorageConfig::default()
        };
        let store = build_blob_store(&config).await.unwrap();
        assert_eq!(store.provider_type(), "memory");
    }
}
