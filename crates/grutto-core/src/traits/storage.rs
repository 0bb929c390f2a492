//! Blob store trait for pluggable object storage backends.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;

use crate::result::AppResult;

/// A short-lived URL granting read access to one blob.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SignedUrl {
    /// The complete URL including signature query parameters.
    pub url: String,
    /// When the URL stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// A byte stream type used for writing blob contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for blob storage backends.
///
/// Keys are opaque strings chosen by the caller. Implementations exist for
/// the local filesystem and an in-memory map in `grutto-storage`.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Store bytes under the given key, replacing any previous content.
    async fn put(&self, key: &str, data: Bytes) -> AppResult<()>;

    /// Store a byte stream under the given key and return the byte count.
    async fn put_stream(&self, key: &str, stream: ByteStream) -> AppResult<u64>;

    /// Read a blob into memory. Missing keys are a not-found error.
    async fn get(&self, key: &str) -> AppResult<Bytes>;

    /// Delete a blob. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether a blob exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Issue a signed read URL valid for `ttl`.
    async fn signed_url(&self, key: &str, ttl: Duration) -> AppResult<SignedUrl>;
}
