//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Color given to folders created without an explicit choice.
pub const DEFAULT_FOLDER_COLOR: &str = "#6BC497";

/// Colors offered by the folder color picker.
pub const FOLDER_PALETTE: [&str; 7] = [
    "#ECA869", "#E4B4E6", "#E86C6C", "#7FABDB", "#6BC497", "#4B8FBA", "#E8C547",
];

/// A folder in a user's file hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: Uuid,
    /// Folder name.
    pub name: String,
    /// Hex color (`#RRGGBB`).
    pub color: String,
    /// The folder owner.
    pub owner_id: Uuid,
    /// Parent folder ID (null for root folders).
    pub parent_folder_id: Option<Uuid>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_folder_id.is_none()
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// Folder name.
    pub name: String,
    /// Hex color.
    pub color: String,
    /// The folder owner.
    pub owner_id: Uuid,
    /// Parent folder (None for root).
    pub parent_folder_id: Option<Uuid>,
}

/// Check that a color is a `#RRGGBB` hex string.
pub fn is_valid_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_valid() {
        assert!(FOLDER_PALETTE.iter().all(|c| is_valid_color(c)));
        assert!(is_valid_color(DEFAULT_FOLDER_COLOR));
    }

    #[test]
    fn test_invalid_colors() {
        assert!(!is_valid_color("6BC497"));
        assert!(!is_valid_color("#6BC49"));
        assert!(!is_valid_color("#GGGGGG"));
        assert!(!is_valid_color("red"));
    }
}
