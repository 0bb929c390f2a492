//! File and folder listing views.
//!
//! Every view is resolved to store queries that already exclude trashed
//! files (except [`FileView::Trash`]), enriched with the uploader's
//! profile through one batched lookup, then narrowed by the search text
//! and type filter and finally ordered.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_core::types::FileSort;
use grutto_database::traits::{FileStore, FolderStore, ProfileStore};
use grutto_entity::file::{File, FileKind};
use grutto_entity::folder::Folder;
use grutto_entity::profile::ProfileSummary;

use crate::access::load_owned_folder;
use crate::context::RequestContext;
use crate::retry::RetryPolicy;

/// How many owned and how many shared files feed the recent view.
const RECENT_PER_SOURCE: i64 = 10;
/// Size of the merged recent view.
const RECENT_TOTAL: usize = 20;

/// Which set of files a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileView {
    /// Newest owned and shared files together.
    Recent,
    /// Owned files at root level.
    Owned,
    /// Files other users shared with the caller.
    Shared,
    /// Files inside one of the caller's folders.
    Folder,
    /// Owned files marked as favorite.
    Favorites,
    /// Owned files in the trash.
    Trash,
}

impl std::str::FromStr for FileView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recent" => Ok(Self::Recent),
            "owned" | "mine" => Ok(Self::Owned),
            "shared" => Ok(Self::Shared),
            "folder" => Ok(Self::Folder),
            "favorites" => Ok(Self::Favorites),
            "trash" => Ok(Self::Trash),
            other => Err(format!("unknown view '{other}'")),
        }
    }
}

/// Parameters of a file listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileQuery {
    /// The view to resolve.
    pub view: FileView,
    /// Folder to list; required for [`FileView::Folder`].
    pub folder_id: Option<Uuid>,
    /// Case-insensitive text matched against name, type and uploader.
    pub search: Option<String>,
    /// Keep only files of this category.
    pub kind: Option<FileKind>,
    /// Display order; `None` keeps the view's natural newest-first order.
    pub sort: Option<FileSort>,
}

impl FileQuery {
    /// A plain query for `view` with no filters.
    pub fn view(view: FileView) -> Self {
        Self {
            view,
            folder_id: None,
            search: None,
            kind: None,
            sort: None,
        }
    }

    /// A plain query for the files of one folder.
    pub fn folder(folder_id: Uuid) -> Self {
        Self {
            folder_id: Some(folder_id),
            ..Self::view(FileView::Folder)
        }
    }
}

/// A file with its derived category and uploader profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// The file row.
    pub file: File,
    /// Category derived from the MIME type.
    pub kind: FileKind,
    /// The owner's profile, when it still exists.
    pub uploader: Option<ProfileSummary>,
}

impl FileEntry {
    /// Whether `needle` (already lowercased) occurs in any searchable field.
    pub fn matches(&self, needle: &str) -> bool {
        if self.file.filename.to_lowercase().contains(needle)
            || self.kind.as_str().contains(needle)
        {
            return true;
        }
        self.uploader.as_ref().is_some_and(|u| {
            u.username.to_lowercase().contains(needle)
                || u
                    .display_name
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(needle))
        })
    }
}

/// A folder with its live file count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderEntry {
    /// The folder row.
    pub folder: Folder,
    /// Files directly inside, trash excluded.
    pub file_count: u64,
}

/// Resolves listing views for files and folders.
#[derive(Clone)]
pub struct QueryService {
    /// File store.
    files: Arc<dyn FileStore>,
    /// Folder store.
    folders: Arc<dyn FolderStore>,
    /// Profile store.
    profiles: Arc<dyn ProfileStore>,
    /// Retry policy for reads.
    retry: RetryPolicy,
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService").finish()
    }
}

impl QueryService {
    /// Creates a new query service.
    pub fn new(
        files: Arc<dyn FileStore>,
        folders: Arc<dyn FolderStore>,
        profiles: Arc<dyn ProfileStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            files,
            folders,
            profiles,
            retry,
        }
    }

    /// Lists files for a view. No results is an empty list, never an error.
    pub async fn list_files(
        &self,
        ctx: &RequestContext,
        query: &FileQuery,
    ) -> AppResult<Vec<FileEntry>> {
        let files = self.fetch_view(ctx, query).await?;
        let mut entries = self.enrich(files).await?;

        if let Some(needle) = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
        {
            entries.retain(|e| e.matches(&needle));
        }
        if let Some(kind) = query.kind {
            entries.retain(|e| e.kind == kind);
        }
        if let Some(sort) = query.sort {
            sort_entries(&mut entries, sort);
        }

        debug!(
            user_id = %ctx.user_id,
            view = ?query.view,
            count = entries.len(),
            "Resolved file listing"
        );
        Ok(entries)
    }

    /// Lists the caller's folders under `parent_id` with file counts from
    /// one grouped count query.
    pub async fn list_folders(
        &self,
        ctx: &RequestContext,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<FolderEntry>> {
        if let Some(parent_id) = parent_id {
            load_owned_folder(self.folders.as_ref(), ctx, parent_id).await?;
        }
        let folders = self
            .retry
            .run("list_folders", || {
                self.folders.find_children(ctx.user_id, parent_id)
            })
            .await?;
        let ids: Vec<Uuid> = folders.iter().map(|f| f.id).collect();
        let counts = self
            .retry
            .run("count_folder_files", || self.folders.count_files(&ids))
            .await?;

        Ok(folders
            .into_iter()
            .map(|folder| FolderEntry {
                file_count: counts.get(&folder.id).copied().unwrap_or(0),
                folder,
            })
            .collect())
    }

    async fn fetch_view(&self, ctx: &RequestContext, query: &FileQuery) -> AppResult<Vec<File>> {
        let user_id = ctx.user_id;
        match query.view {
            FileView::Owned => {
                self.retry
                    .run("list_owned", || self.files.find_root_by_owner(user_id))
                    .await
            }
            FileView::Shared => {
                self.retry
                    .run("list_shared", || self.files.find_shared_with(user_id, None))
                    .await
            }
            FileView::Favorites => {
                self.retry
                    .run("list_favorites", || self.files.find_favorites(user_id))
                    .await
            }
            FileView::Trash => {
                self.retry
                    .run("list_trash", || self.files.find_trashed(user_id))
                    .await
            }
            FileView::Folder => {
                let folder_id = query
                    .folder_id
                    .ok_or_else(|| AppError::validation("The folder view needs a folder id"))?;
                load_owned_folder(self.folders.as_ref(), ctx, folder_id).await?;
                self.retry
                    .run("list_folder", || self.files.find_by_folder(folder_id))
                    .await
            }
            FileView::Recent => {
                let (owned, shared) = futures::try_join!(
                    self.retry.run("list_recent_owned", || {
                        self.files.find_recent_by_owner(user_id, RECENT_PER_SOURCE)
                    }),
                    self.retry.run("list_recent_shared", || {
                        self.files.find_shared_with(user_id, Some(RECENT_PER_SOURCE))
                    }),
                )?;
                Ok(merge_recent(owned, shared))
            }
        }
    }

    /// Attach uploader profiles, fetched once for the distinct owners.
    async fn enrich(&self, files: Vec<File>) -> AppResult<Vec<FileEntry>> {
        let owner_ids: Vec<Uuid> = files
            .iter()
            .map(|f| f.owner_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let profiles: HashMap<Uuid, ProfileSummary> = if owner_ids.is_empty() {
            HashMap::new()
        } else {
            self.retry
                .run("load_uploaders", || self.profiles.find_by_ids(&owner_ids))
                .await?
                .into_iter()
                .map(|p| (p.id, p.summary()))
                .collect()
        };

        Ok(files
            .into_iter()
            .map(|file| FileEntry {
                kind: file.kind(),
                uploader: profiles.get(&file.owner_id).cloned(),
                file,
            })
            .collect())
    }
}

/// Merge owned and shared recents newest first, keeping at most 20.
fn merge_recent(owned: Vec<File>, shared: Vec<File>) -> Vec<File> {
    let mut seen = HashSet::new();
    let mut merged: Vec<File> = owned
        .into_iter()
        .chain(shared)
        .filter(|f| seen.insert(f.id))
        .collect();
    merged.sort_by(|a, b| b.upload_date.cmp(&a.upload_date).then(b.id.cmp(&a.id)));
    merged.truncate(RECENT_TOTAL);
    merged
}

/// Order entries; ties always break on id so the order is deterministic.
pub fn sort_entries(entries: &mut [FileEntry], sort: FileSort) {
    let direction = sort.direction();
    entries.sort_by(|a, b| {
        let primary = match sort {
            FileSort::Name => a
                .file
                .filename
                .to_lowercase()
                .cmp(&b.file.filename.to_lowercase()),
            FileSort::UploadDate => a.file.upload_date.cmp(&b.file.upload_date),
        };
        direction.apply(primary.then(a.file.id.cmp(&b.file.id)))
    });
}
