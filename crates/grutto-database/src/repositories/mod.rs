//! PostgreSQL implementations of the store traits.

pub mod file;
pub mod folder;
pub mod notification;
pub mod profile;
pub mod share;

pub use file::FileRepository;
pub use folder::FolderRepository;
pub use notification::NotificationRepository;
pub use profile::ProfileRepository;
pub use share::ShareRepository;
