//! # grutto-service
//!
//! Storage and sharing domain services for Grutto Study. Each service
//! orchestrates the store traits and the blob store to implement one
//! group of use cases: listing, upload, single-file operations, trash,
//! favorites, folders, sharing, notifications and profiles.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time as `Arc<dyn ...>` handles, so the same code runs
//! against PostgreSQL or the in-memory stores.

pub(crate) mod access;
pub mod context;
pub mod file;
pub mod folder;
pub mod notification;
pub mod profile;
pub mod retry;
pub mod share;

use std::sync::Arc;
use std::time::Duration;

use grutto_core::config::AppConfig;
use grutto_core::traits::BlobStore;
use grutto_database::Repositories;

pub use context::RequestContext;
pub use file::{
    FavoriteService, FavoriteState, FileService, QueryService, TrashService, UploadService,
};
pub use folder::{FolderService, TreeService};
pub use notification::NotificationService;
pub use profile::ProfileService;
pub use retry::RetryPolicy;
pub use share::ShareService;

/// Every domain service, wired to one set of stores.
#[derive(Debug, Clone)]
pub struct DomainServices {
    /// Profile registration and updates.
    pub profiles: ProfileService,
    /// File and folder listings.
    pub query: QueryService,
    /// Batch upload pipeline.
    pub upload: UploadService,
    /// Single-file operations.
    pub files: FileService,
    /// Trash lifecycle.
    pub trash: TrashService,
    /// Favorite flags.
    pub favorites: FavoriteService,
    /// Folder CRUD.
    pub folders: FolderService,
    /// Folder tree and breadcrumbs.
    pub tree: TreeService,
    /// Share grants.
    pub shares: ShareService,
    /// Notification panel.
    pub notifications: NotificationService,
}

impl DomainServices {
    /// Wires every service from the given stores and configuration.
    pub fn new(repos: &Repositories, blobs: Arc<dyn BlobStore>, config: &AppConfig) -> Self {
        let retry = RetryPolicy::default();
        let signed_url_ttl = Duration::from_secs(config.storage.signed_url.ttl_seconds);

        Self {
            profiles: ProfileService::new(repos.profiles.clone()),
            query: QueryService::new(
                repos.files.clone(),
                repos.folders.clone(),
                repos.profiles.clone(),
                retry,
            ),
            upload: UploadService::new(
                repos.files.clone(),
                repos.folders.clone(),
                repos.profiles.clone(),
                blobs.clone(),
                config.upload.clone(),
            ),
            files: FileService::new(
                repos.files.clone(),
                repos.folders.clone(),
                repos.shares.clone(),
                blobs.clone(),
                signed_url_ttl,
                retry,
            ),
            trash: TrashService::new(
                repos.files.clone(),
                repos.notifications.clone(),
                repos.profiles.clone(),
                blobs,
                retry,
            ),
            favorites: FavoriteService::new(repos.files.clone()),
            folders: FolderService::new(repos.folders.clone(), repos.notifications.clone()),
            tree: TreeService::new(repos.folders.clone(), retry),
            shares: ShareService::new(
                repos.files.clone(),
                repos.shares.clone(),
                repos.profiles.clone(),
                repos.notifications.clone(),
                config.sharing.clone(),
            ),
            notifications: NotificationService::new(
                repos.notifications.clone(),
                repos.profiles.clone(),
                repos.files.clone(),
                config.notifications.clone(),
                retry,
            ),
        }
    }
}
