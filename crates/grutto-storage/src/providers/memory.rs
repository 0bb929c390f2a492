//! In-memory blob store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use futures::stream::StreamExt;

use grutto_core::error::{AppError, ErrorKind};
use grutto_core::result::AppResult;
use grutto_core::traits::{BlobStore, ByteStream, SignedUrl};

use super::validate_key;
use crate::signed::SignedUrlIssuer;

/// Blob store holding every blob in a process-local map.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    blobs: Arc<DashMap<String, Bytes>>,
    issuer: SignedUrlIssuer,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new(issuer: SignedUrlIssuer) -> Self {
        Self {
            blobs: Arc::new(DashMap::new()),
            issuer,
        }
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Every stored key, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, key: &str, data: Bytes) -> AppResult<()> {
        validate_key(key)?;
        self.blobs.insert(key.to_string(), data);
        Ok(())
    }

    async fn put_stream(&self, key: &str, mut stream: ByteStream) -> AppResult<u64> {
        validate_key(key)?;
        let mut buffer = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| AppError::with_source(ErrorKind::Storage, "Stream read error", e))?;
            buffer.extend_from_slice(&chunk);
        }
        let total = buffer.len() as u64;
        self.blobs.insert(key.to_string(), buffer.freeze());
        Ok(total)
    }

    async fn get(&self, key: &str) -> AppResult<Bytes> {
        self.blobs
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {key}")))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.blobs.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.blobs.contains_key(key))
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> AppResult<SignedUrl> {
        validate_key(key)?;
        self.issuer.issue(key, ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use grutto_core::config::SignedUrlConfig;

    #[tokio::test]
    async fn test_round_trip_and_delete() {
        let store = MemoryBlobStore::new(SignedUrlIssuer::new(&SignedUrlConfig::default()));
        store.put("u1/a.pdf", Bytes::from("pdf")).await.unwrap();
        assert_eq!(store.get("u1/a.pdf").await.unwrap(), Bytes::from("pdf"));
        assert_eq!(store.keys(), vec!["u1/a.pdf".to_string()]);

        store.delete("u1/a.pdf").await.unwrap();
        store.delete("u1/a.pdf").await.unwrap();
        assert!(store.is_empty());
        assert!(store.get("u1/a.pdf").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_signed_url_uses_key() {
        let store = MemoryBlobStore::new(SignedUrlIssuer::new(&SignedUrlConfig::default()));
        let url = store
            .signed_url("u1/a.pdf", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.url.contains("/u1/a.pdf?expires="));
        assert!(url.expires_at > Utc::now());
    }
}
