//! Soft delete, recovery and purge.
//!
//! A file is `active`, `trashed` or gone. Trashing sets `deleted_at` and
//! leaves a `file_deleted` self-notification that drives the recovery
//! panel; recovering clears both. Purging deletes the blob first and only
//! then the row, so a failed blob delete leaves the file recoverable.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_core::traits::BlobStore;
use grutto_database::traits::{FileStore, NotificationStore, ProfileStore};
use grutto_entity::file::File;
use grutto_entity::notification::{CreateNotification, NotificationType};

use crate::access::load_owned_file;
use crate::context::RequestContext;
use crate::retry::RetryPolicy;

/// Drives the file trash lifecycle.
#[derive(Clone)]
pub struct TrashService {
    /// File store.
    files: Arc<dyn FileStore>,
    /// Notification store.
    notifications: Arc<dyn NotificationStore>,
    /// Profile store, for storage accounting.
    profiles: Arc<dyn ProfileStore>,
    /// Blob store.
    blobs: Arc<dyn BlobStore>,
    /// Retry policy for reads.
    retry: RetryPolicy,
}

impl std::fmt::Debug for TrashService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrashService").finish()
    }
}

impl TrashService {
    /// Creates a new trash service.
    pub fn new(
        files: Arc<dyn FileStore>,
        notifications: Arc<dyn NotificationStore>,
        profiles: Arc<dyn ProfileStore>,
        blobs: Arc<dyn BlobStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            files,
            notifications,
            profiles,
            blobs,
            retry,
        }
    }

    /// Lists the caller's trashed files, most recently trashed first.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<File>> {
        self.retry
            .run("list_trash", || self.files.find_trashed(ctx.user_id))
            .await
    }

    /// Moves an owned file to the trash. It disappears from every other
    /// view at once, recipients' shared views included.
    pub async fn trash(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        let file = load_owned_file(self.files.as_ref(), ctx, file_id).await?;
        if file.is_trashed() {
            return Err(AppError::conflict(format!(
                "{} is already in the trash",
                file.filename
            )));
        }
        let trashed = self.files.soft_delete(file_id, ctx.user_id).await?;

        let notice = CreateNotification::file_deleted(ctx.user_id, file_id, &trashed.filename);
        if let Err(e) = self.notifications.create(&notice).await {
            warn!(file_id = %file_id, error = %e, "Failed to record trash notification");
        }

        info!(file_id = %file_id, user_id = %ctx.user_id, "File moved to trash");
        Ok(trashed)
    }

    /// Brings a trashed file back to exactly where it was.
    pub async fn recover(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        let file = load_owned_file(self.files.as_ref(), ctx, file_id).await?;
        if !file.is_trashed() {
            return Err(AppError::conflict(format!(
                "{} is not in the trash",
                file.filename
            )));
        }
        let restored = self.files.restore(file_id).await?;

        if let Err(e) = self
            .notifications
            .delete_for_file(file_id, NotificationType::FileDeleted)
            .await
        {
            warn!(file_id = %file_id, error = %e, "Failed to clear trash notification");
        }

        info!(file_id = %file_id, user_id = %ctx.user_id, "File recovered from trash");
        Ok(restored)
    }

    /// Permanently deletes a trashed file.
    ///
    /// The blob goes first. If that fails nothing else changes. If the row
    /// removal then fails, the error is returned and the row is left for
    /// reconciliation.
    pub async fn purge(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<()> {
        let file = load_owned_file(self.files.as_ref(), ctx, file_id).await?;
        if !file.is_trashed() {
            return Err(AppError::conflict(format!(
                "{} must be moved to the trash before it can be deleted permanently",
                file.filename
            )));
        }

        self.blobs.delete(&file.storage_url).await?;

        if let Err(e) = self.files.purge(file_id).await {
            error!(
                file_id = %file_id,
                storage_key = %file.storage_url,
                error = %e,
                "Blob deleted but file row purge failed"
            );
            return Err(e);
        }

        if let Err(e) = self
            .profiles
            .adjust_storage_used(file.owner_id, -file.file_size)
            .await
        {
            warn!(user_id = %file.owner_id, error = %e, "Failed to update storage usage");
        }

        info!(file_id = %file_id, user_id = %ctx.user_id, "File purged");
        Ok(())
    }
}
