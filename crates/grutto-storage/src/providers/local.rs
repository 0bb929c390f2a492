//! Local filesystem blob store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use grutto_core::error::{AppError, ErrorKind};
use grutto_core::result::AppResult;
use grutto_core::traits::{BlobStore, ByteStream, SignedUrl};

use super::validate_key;
use crate::signed::SignedUrlIssuer;

/// Blob store keeping each blob as a file under a root directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
    /// Signs read URLs.
    issuer: SignedUrlIssuer,
}

impl LocalBlobStore {
    /// Create a store rooted at `root_path`, creating the directory.
    pub async fn new(root_path: &str, issuer: SignedUrlIssuer) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root, issuer })
    }

    /// Resolve a key to a path within the root.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key.trim_start_matches('/')))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

fn read_error(key: &str, e: std::io::Error) -> AppError {
    if e.kind() == std::io::ErrorKind::NotFound {
        AppError::not_found(format!("Blob not found: {key}"))
    } else {
        AppError::with_source(ErrorKind::Storage, format!("Failed to read blob: {key}"), e)
    }
}

/// Drain `stream` into `file` and flush it. Any error leaves a partial file.
async fn write_chunks(file: &mut fs::File, stream: &mut ByteStream) -> std::io::Result<u64> {
    let mut total = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        total += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(total)
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.root.is_dir())
    }

    async fn put(&self, key: &str, data: Bytes) -> AppResult<()> {
        let full_path = self.resolve(key)?;
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to write blob: {key}"), e)
        })?;

        debug!(key, bytes = data.len(), "Wrote blob");
        Ok(())
    }

    async fn put_stream(&self, key: &str, mut stream: ByteStream) -> AppResult<u64> {
        let full_path = self.resolve(key)?;
        self.ensure_parent(&full_path).await?;

        let mut file = fs::File::create(&full_path).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to create blob: {key}"), e)
        })?;

        let total_bytes = match write_chunks(&mut file, &mut stream).await {
            Ok(total) => total,
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(&full_path).await;
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to write blob: {key}"),
                    e,
                ));
            }
        };

        debug!(key, bytes = total_bytes, "Wrote blob from stream");
        Ok(total_bytes)
    }

    async fn get(&self, key: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(key)?;
        let data = fs::read(&full_path).await.map_err(|e| read_error(key, e))?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_path = self.resolve(key)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(key, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete blob: {key}"),
                e,
            )),
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_path = self.resolve(key)?;
        Ok(fs::try_exists(&full_path).await.unwrap_or(false) && full_path.is_file())
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> AppResult<SignedUrl> {
        validate_key(key)?;
        self.issuer.issue(key, ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grutto_core::config::SignedUrlConfig;

    async fn store(dir: &tempfile::TempDir) -> LocalBlobStore {
        LocalBlobStore::new(
            dir.path().to_str().unwrap(),
            SignedUrlIssuer::new(&SignedUrlConfig::default()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let data = Bytes::from("hello world");
        store.put("u1/file.pdf", data.clone()).await.unwrap();
        assert!(store.exists("u1/file.pdf").await.unwrap());

        let read_back = store.get("u1/file.pdf").await.unwrap();
        assert_eq!(read_back, data);
        assert_eq!(read_back.len(), 11);

        store.delete("u1/file.pdf").await.unwrap();
        assert!(!store.exists("u1/file.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        assert!(store.get("nope").await.unwrap_err().is_not_found());
        store.delete("nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_put_stream() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let chunks: Vec<Result<Bytes, std::io::Error>> =
            vec![Ok(Bytes::from("abc")), Ok(Bytes::from("defg"))];
        let written = store
            .put_stream("u1/s.docx", Box::pin(futures::stream::iter(chunks)))
            .await
            .unwrap();
        assert_eq!(written, 7);
        assert_eq!(store.get("u1/s.docx").await.unwrap(), Bytes::from("abcdefg"));
    }

    #[tokio::test]
    async fn test_failed_stream_leaves_no_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from("abc")),
            Err(std::io::Error::other("connection reset")),
        ];
        let err = store
            .put_stream("u1/broken.pdf", Box::pin(futures::stream::iter(chunks)))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(!store.exists("u1/broken.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let err = store.put("../escape", Bytes::from("x")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
