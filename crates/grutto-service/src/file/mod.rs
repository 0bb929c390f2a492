//! File services: listing, upload, single-file operations, trash and favorites.

pub mod favorite;
pub mod query;
pub mod service;
pub mod trash;
pub mod upload;

pub use favorite::{FavoriteService, FavoriteState, PendingToggle};
pub use query::{FileEntry, FileQuery, FileView, FolderEntry, QueryService};
pub use service::{Download, FileService};
pub use trash::TrashService;
pub use upload::{
    UploadCandidate, UploadEvent, UploadFailure, UploadOptions, UploadReport, UploadService,
};
