//! Folder CRUD operations with ownership enforcement.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_database::traits::{FolderStore, NotificationStore};
use grutto_entity::folder::{CreateFolder, DEFAULT_FOLDER_COLOR, Folder, is_valid_color};
use grutto_entity::notification::CreateNotification;

use crate::access::load_owned_folder;
use crate::context::RequestContext;

/// Manages folder CRUD operations.
#[derive(Clone)]
pub struct FolderService {
    /// Folder store.
    folders: Arc<dyn FolderStore>,
    /// Notification store, for the deletion notice.
    notifications: Arc<dyn NotificationStore>,
}

impl std::fmt::Debug for FolderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderService").finish()
    }
}

/// Request to create a new folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    /// Folder name.
    pub name: String,
    /// Hex color; the default green when absent.
    pub color: Option<String>,
    /// Parent folder ID (None for root-level).
    pub parent_folder_id: Option<Uuid>,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(folders: Arc<dyn FolderStore>, notifications: Arc<dyn NotificationStore>) -> Self {
        Self {
            folders,
            notifications,
        }
    }

    /// Gets a folder the caller owns.
    pub async fn get_folder(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<Folder> {
        load_owned_folder(self.folders.as_ref(), ctx, folder_id).await
    }

    /// Creates a new folder.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        req: CreateFolderRequest,
    ) -> AppResult<Folder> {
        let name = validate_name(&req.name)?;
        let color = match req.color {
            Some(c) => validate_color(&c)?,
            None => DEFAULT_FOLDER_COLOR.to_string(),
        };

        if let Some(parent_id) = req.parent_folder_id {
            self.get_folder(ctx, parent_id).await?;
        }

        let folder = self
            .folders
            .create(&CreateFolder {
                name,
                color,
                owner_id: ctx.user_id,
                parent_folder_id: req.parent_folder_id,
            })
            .await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            name = %folder.name,
            "Folder created"
        );

        Ok(folder)
    }

    /// Renames a folder.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        new_name: &str,
    ) -> AppResult<Folder> {
        let name = validate_name(new_name)?;
        let mut folder = self.get_folder(ctx, folder_id).await?;
        folder.name = name;
        folder.updated_at = Utc::now();

        let folder = self.folders.update(&folder).await?;
        info!(user_id = %ctx.user_id, folder_id = %folder_id, new_name = %folder.name, "Folder renamed");
        Ok(folder)
    }

    /// Changes a folder's color.
    pub async fn recolor_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        color: &str,
    ) -> AppResult<Folder> {
        let color = validate_color(color)?;
        let mut folder = self.get_folder(ctx, folder_id).await?;
        folder.color = color;
        folder.updated_at = Utc::now();

        self.folders.update(&folder).await
    }

    /// Moves a folder under a new parent, or to root.
    ///
    /// A folder can never become its own ancestor. The store checks the
    /// ancestry and writes the new parent in one step.
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> AppResult<Folder> {
        self.get_folder(ctx, folder_id).await?;

        if let Some(parent_id) = new_parent_id {
            if parent_id == folder_id {
                return Err(AppError::validation("Cannot move a folder into itself"));
            }
            self.get_folder(ctx, parent_id).await?;
        }

        let folder = self.folders.reparent(folder_id, new_parent_id).await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder_id,
            new_parent_id = ?new_parent_id,
            "Folder moved"
        );

        Ok(folder)
    }

    /// Deletes a folder. Its files go to root and its subfolders to its
    /// parent; the owner gets a `folder_deleted` notice.
    pub async fn delete_folder(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<()> {
        let folder = self.get_folder(ctx, folder_id).await?;
        self.folders.delete(folder_id).await?;

        let notice = CreateNotification::folder_deleted(ctx.user_id, &folder.name);
        if let Err(e) = self.notifications.create(&notice).await {
            warn!(folder_id = %folder_id, error = %e, "Failed to record folder deletion notice");
        }

        info!(user_id = %ctx.user_id, folder_id = %folder_id, "Folder deleted");
        Ok(())
    }
}

fn validate_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Folder name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_color(color: &str) -> AppResult<String> {
    let color = color.trim();
    if !is_valid_color(color) {
        return Err(AppError::validation(format!(
            "Invalid folder color '{color}', expected #RRGGBB"
        )));
    }
    Ok(color.to_ascii_uppercase())
}
