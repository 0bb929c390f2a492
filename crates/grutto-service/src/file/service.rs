//! Single-file operations: open, rename, move, download, signed URL.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_core::traits::{BlobStore, SignedUrl};
use grutto_database::traits::{FileStore, FolderStore, ShareStore};
use grutto_entity::file::File;

use crate::access::{load_owned_file, load_owned_folder, load_readable_file};
use crate::context::RequestContext;
use crate::retry::RetryPolicy;

/// File contents together with the name to save them under.
#[derive(Debug, Clone)]
pub struct Download {
    /// Display name.
    pub filename: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Contents.
    pub data: Bytes,
}

/// Operations on one file the caller owns or has been granted.
#[derive(Clone)]
pub struct FileService {
    /// File store.
    files: Arc<dyn FileStore>,
    /// Folder store.
    folders: Arc<dyn FolderStore>,
    /// Share store.
    shares: Arc<dyn ShareStore>,
    /// Blob store.
    blobs: Arc<dyn BlobStore>,
    /// Lifetime of issued viewer URLs.
    signed_url_ttl: Duration,
    /// Retry policy for reads.
    retry: RetryPolicy,
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService")
            .field("signed_url_ttl", &self.signed_url_ttl)
            .finish()
    }
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        files: Arc<dyn FileStore>,
        folders: Arc<dyn FolderStore>,
        shares: Arc<dyn ShareStore>,
        blobs: Arc<dyn BlobStore>,
        signed_url_ttl: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            files,
            folders,
            shares,
            blobs,
            signed_url_ttl,
            retry,
        }
    }

    /// Opens a file and records the access.
    pub async fn get_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        let mut file = self.readable(ctx, file_id).await?;
        let now = ctx.request_time;
        if let Err(e) = self.files.touch(file_id, now).await {
            warn!(file_id = %file_id, error = %e, "Failed to record file access");
        } else {
            file.last_accessed = Some(now);
        }
        Ok(file)
    }

    /// Renames a file the caller owns.
    pub async fn rename(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        new_name: &str,
    ) -> AppResult<File> {
        let name = new_name.trim();
        if name.is_empty() {
            return Err(AppError::validation("File name cannot be empty"));
        }
        let file = load_owned_file(self.files.as_ref(), ctx, file_id).await?;
        if file.is_trashed() {
            return Err(AppError::conflict("Files in the trash cannot be renamed"));
        }
        let updated = self.files.rename(file_id, name).await?;
        info!(file_id = %file_id, user_id = %ctx.user_id, "File renamed");
        Ok(updated)
    }

    /// Moves a file into one of the caller's folders, or to root with `None`.
    pub async fn move_to_folder(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        folder_id: Option<Uuid>,
    ) -> AppResult<File> {
        let file = load_owned_file(self.files.as_ref(), ctx, file_id).await?;
        if file.is_trashed() {
            return Err(AppError::conflict("Files in the trash cannot be moved"));
        }
        if let Some(folder_id) = folder_id {
            load_owned_folder(self.folders.as_ref(), ctx, folder_id).await?;
        }
        let updated = self.files.set_folder(file_id, folder_id).await?;
        info!(file_id = %file_id, folder_id = ?folder_id, "File moved");
        Ok(updated)
    }

    /// Reads a file's contents.
    pub async fn download(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<Download> {
        let file = self.readable(ctx, file_id).await?;
        let data = self
            .retry
            .run("download_blob", || self.blobs.get(&file.storage_url))
            .await?;
        Ok(Download {
            filename: file.filename,
            content_type: file.file_type,
            data,
        })
    }

    /// Issues a short-lived read URL for an external document viewer.
    pub async fn signed_url(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<SignedUrl> {
        let file = self.readable(ctx, file_id).await?;
        self.blobs
            .signed_url(&file.storage_url, self.signed_url_ttl)
            .await
    }

    async fn readable(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        self.retry
            .run("load_file", || {
                load_readable_file(self.files.as_ref(), self.shares.as_ref(), ctx, file_id)
            })
            .await
    }
}
