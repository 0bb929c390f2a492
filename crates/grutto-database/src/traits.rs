//! Store traits consumed by the domain service.
//!
//! Each trait is object safe and held as `Arc<dyn ...>`. List queries used
//! by normal views never return soft-deleted files; the trash query is the
//! only exception.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use grutto_core::result::AppResult;
use grutto_entity::file::{CreateFile, File};
use grutto_entity::folder::{CreateFolder, Folder};
use grutto_entity::notification::{CreateNotification, Notification, NotificationType};
use grutto_entity::profile::{CreateProfile, Profile};
use grutto_entity::share::{CreateFileShare, FileShare};

/// Deepest folder ancestry walked before the chain is treated as corrupt.
pub const MAX_FOLDER_DEPTH: usize = 1024;

/// Profile persistence.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert a profile. A taken username is a `Conflict`.
    async fn create(&self, input: &CreateProfile) -> AppResult<Profile>;

    /// Find a profile by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Profile>>;

    /// Fetch every profile in `ids` in one round trip.
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Profile>>;

    /// Find a profile by exact username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Profile>>;

    /// Case-insensitive username prefix search, ordered by username.
    async fn search_by_username_prefix(
        &self,
        prefix: &str,
        exclude: &[Uuid],
        limit: i64,
    ) -> AppResult<Vec<Profile>>;

    /// Replace the display name.
    async fn update_display_name(
        &self,
        id: Uuid,
        display_name: Option<&str>,
    ) -> AppResult<Profile>;

    /// Replace the profile picture location.
    async fn update_picture_url(&self, id: Uuid, url: Option<&str>) -> AppResult<Profile>;

    /// Add `delta` bytes (negative to subtract) to `storage_used`, never
    /// dropping below zero.
    async fn adjust_storage_used(&self, id: Uuid, delta: i64) -> AppResult<()>;
}

/// Folder persistence.
#[async_trait]
pub trait FolderStore: Send + Sync {
    /// Insert a folder.
    async fn create(&self, input: &CreateFolder) -> AppResult<Folder>;

    /// Find a folder by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Folder>>;

    /// Folders of `owner_id` directly under `parent_id` (`None` for root),
    /// ordered by name.
    async fn find_children(&self, owner_id: Uuid, parent_id: Option<Uuid>)
    -> AppResult<Vec<Folder>>;

    /// Every folder of `owner_id`.
    async fn find_all_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Folder>>;

    /// Persist name and color; bumps `updated_at`. The parent is changed
    /// only through [`FolderStore::reparent`].
    async fn update(&self, folder: &Folder) -> AppResult<Folder>;

    /// Move a folder under `new_parent_id` (`None` for root). The ancestry
    /// check and the write happen atomically: a move that would make the
    /// folder its own ancestor fails with `Validation`, even when another
    /// move of the same owner's folders runs at the same time.
    async fn reparent(&self, id: Uuid, new_parent_id: Option<Uuid>) -> AppResult<Folder>;

    /// Live file count per folder in one grouped query. Folders without
    /// files are absent from the map.
    async fn count_files(&self, folder_ids: &[Uuid]) -> AppResult<HashMap<Uuid, u64>>;

    /// Delete a folder. Its files move to root and its child folders move
    /// to its parent, atomically with the row delete.
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// File persistence.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Insert a file row.
    async fn create(&self, input: &CreateFile) -> AppResult<File>;

    /// Find a file by ID in any state, trashed included.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>>;

    /// Fetch every file in `ids`, any state, in one round trip.
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<File>>;

    /// Live root-level files of `owner_id`, newest first. A file whose
    /// folder no longer exists counts as root-level.
    async fn find_root_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<File>>;

    /// The `limit` newest live files of `owner_id` in any folder.
    async fn find_recent_by_owner(&self, owner_id: Uuid, limit: i64) -> AppResult<Vec<File>>;

    /// Live files in a folder, newest first.
    async fn find_by_folder(&self, folder_id: Uuid) -> AppResult<Vec<File>>;

    /// Live files shared with `user_id`, newest first, optionally capped.
    async fn find_shared_with(&self, user_id: Uuid, limit: Option<i64>) -> AppResult<Vec<File>>;

    /// Live favorites of `owner_id`, newest first.
    async fn find_favorites(&self, owner_id: Uuid) -> AppResult<Vec<File>>;

    /// Trashed files of `owner_id`, most recently trashed first.
    async fn find_trashed(&self, owner_id: Uuid) -> AppResult<Vec<File>>;

    /// Set the display name. No other column is written.
    async fn rename(&self, id: Uuid, filename: &str) -> AppResult<File>;

    /// Set the containing folder (`None` for root). No other column is written.
    async fn set_folder(&self, id: Uuid, folder_id: Option<Uuid>) -> AppResult<File>;

    /// Set the favorite flag.
    async fn set_favorite(&self, id: Uuid, is_favorite: bool) -> AppResult<File>;

    /// Record an access.
    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    /// Move a live file to the trash.
    async fn soft_delete(&self, id: Uuid, deleted_by: Uuid) -> AppResult<File>;

    /// Bring a trashed file back.
    async fn restore(&self, id: Uuid) -> AppResult<File>;

    /// Remove the row together with its shares and its `file_deleted`
    /// notification. Other notifications keep existing with `file_id`
    /// cleared.
    async fn purge(&self, id: Uuid) -> AppResult<()>;
}

/// File share persistence.
#[async_trait]
pub trait ShareStore: Send + Sync {
    /// Insert grants, skipping any (file, recipient) pair that already
    /// exists. Returns only the rows actually inserted.
    async fn create_many(&self, inputs: &[CreateFileShare]) -> AppResult<Vec<FileShare>>;

    /// Every grant on a file, oldest first.
    async fn find_by_file(&self, file_id: Uuid) -> AppResult<Vec<FileShare>>;

    /// The grant of `file_id` to `user_id`, if any.
    async fn find(&self, file_id: Uuid, user_id: Uuid) -> AppResult<Option<FileShare>>;

    /// Remove the grant of `file_id` to `user_id`. Returns whether one existed.
    async fn delete(&self, file_id: Uuid, user_id: Uuid) -> AppResult<bool>;
}

/// Notification persistence.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert a notification.
    async fn create(&self, input: &CreateNotification) -> AppResult<Notification>;

    /// Find a notification by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>>;

    /// Notifications of a recipient, newest first.
    async fn find_by_recipient(&self, recipient_id: Uuid) -> AppResult<Vec<Notification>>;

    /// Unread notifications of a recipient created at or after `since`.
    async fn count_unread(&self, recipient_id: Uuid, since: DateTime<Utc>) -> AppResult<i64>;

    /// Mark one notification of `recipient_id` read. Returns whether it existed.
    async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> AppResult<bool>;

    /// Mark every notification of a recipient read. Returns rows changed.
    async fn mark_all_read(&self, recipient_id: Uuid) -> AppResult<u64>;

    /// Delete one notification of `recipient_id`. Returns whether it existed.
    async fn delete(&self, id: Uuid, recipient_id: Uuid) -> AppResult<bool>;

    /// Delete notifications of `kind` that reference `file_id`.
    async fn delete_for_file(&self, file_id: Uuid, kind: NotificationType) -> AppResult<u64>;

    /// Delete notifications created before `cutoff`, for one recipient or
    /// for everyone.
    async fn delete_older_than(
        &self,
        recipient_id: Option<Uuid>,
        cutoff: DateTime<Utc>,
    ) -> AppResult<u64>;
}
