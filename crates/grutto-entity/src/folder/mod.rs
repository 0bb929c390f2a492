//! Folder domain entities.

pub mod model;
pub mod tree;

pub use model::{CreateFolder, DEFAULT_FOLDER_COLOR, FOLDER_PALETTE, Folder, is_valid_color};
pub use tree::{FolderNode, FolderTree};
