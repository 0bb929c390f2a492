//! # grutto-database
//!
//! Persistence boundary for Grutto Study. Defines the store traits the
//! domain service consumes, a PostgreSQL implementation of each one and a
//! process-local implementation used for tests and the `memory` backend.

pub mod connection;
pub mod error;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod traits;

use std::sync::Arc;

pub use connection::DatabasePool;
pub use memory::MemoryDatabase;
pub use traits::{FileStore, FolderStore, NotificationStore, ProfileStore, ShareStore};

use repositories::{
    FileRepository, FolderRepository, NotificationRepository, ProfileRepository, ShareRepository,
};

/// The full set of stores handed to the service layer.
#[derive(Clone)]
pub struct Repositories {
    /// Profiles.
    pub profiles: Arc<dyn ProfileStore>,
    /// Folders.
    pub folders: Arc<dyn FolderStore>,
    /// Files.
    pub files: Arc<dyn FileStore>,
    /// File shares.
    pub shares: Arc<dyn ShareStore>,
    /// Notifications.
    pub notifications: Arc<dyn NotificationStore>,
}

impl Repositories {
    /// PostgreSQL-backed stores sharing one pool.
    pub fn postgres(pool: &DatabasePool) -> Self {
        let pool = pool.pool().clone();
        Self {
            profiles: Arc::new(ProfileRepository::new(pool.clone())),
            folders: Arc::new(FolderRepository::new(pool.clone())),
            files: Arc::new(FileRepository::new(pool.clone())),
            shares: Arc::new(ShareRepository::new(pool.clone())),
            notifications: Arc::new(NotificationRepository::new(pool)),
        }
    }

    /// Stores backed by one shared [`MemoryDatabase`].
    pub fn in_memory() -> Self {
        Self::from_memory(Arc::new(MemoryDatabase::new()))
    }

    /// Stores backed by the given [`MemoryDatabase`].
    pub fn from_memory(db: Arc<MemoryDatabase>) -> Self {
        Self {
            profiles: db.clone(),
            folders: db.clone(),
            files: db.clone(),
            shares: db.clone(),
            notifications: db,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
