//! Ownership and share checks shared by the services.
//!
//! A missing row is `NotFound`; a row the caller may not touch is
//! `Authorization`. Callers that face end users collapse both through
//! `AppError::user_message`.

use uuid::Uuid;

use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_database::traits::{FileStore, FolderStore, ShareStore};
use grutto_entity::file::File;
use grutto_entity::folder::Folder;

use crate::context::RequestContext;

/// Load a file in any state.
pub(crate) async fn load_file(files: &dyn FileStore, file_id: Uuid) -> AppResult<File> {
    files
        .find_by_id(file_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))
}

/// Load a file the caller owns, in any state.
pub(crate) async fn load_owned_file(
    files: &dyn FileStore,
    ctx: &RequestContext,
    file_id: Uuid,
) -> AppResult<File> {
    let file = load_file(files, file_id).await?;
    if file.owner_id != ctx.user_id {
        return Err(AppError::authorization(format!(
            "User {} does not own file {file_id}",
            ctx.user_id
        )));
    }
    Ok(file)
}

/// Load a file the caller owns or has been granted.
///
/// Trashed files are visible to their owner only.
pub(crate) async fn load_readable_file(
    files: &dyn FileStore,
    shares: &dyn ShareStore,
    ctx: &RequestContext,
    file_id: Uuid,
) -> AppResult<File> {
    let file = load_file(files, file_id).await?;
    if file.owner_id == ctx.user_id {
        return Ok(file);
    }
    if file.is_trashed() {
        return Err(AppError::not_found(format!("File {file_id} not found")));
    }
    match shares.find(file_id, ctx.user_id).await? {
        Some(_) => Ok(file),
        None => Err(AppError::authorization(format!(
            "File {file_id} is not shared with user {}",
            ctx.user_id
        ))),
    }
}

/// Load a folder the caller owns.
pub(crate) async fn load_owned_folder(
    folders: &dyn FolderStore,
    ctx: &RequestContext,
    folder_id: Uuid,
) -> AppResult<Folder> {
    let folder = folders
        .find_by_id(folder_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;
    if folder.owner_id != ctx.user_id {
        return Err(AppError::authorization(format!(
            "User {} does not own folder {folder_id}",
            ctx.user_id
        )));
    }
    Ok(folder)
}
