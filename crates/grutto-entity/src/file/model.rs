//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::FileKind;

/// A document uploaded by a student.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: Uuid,
    /// Display name shown to users (including extension).
    pub filename: String,
    /// Declared MIME type.
    pub file_type: String,
    /// File size in bytes.
    pub file_size: i64,
    /// Blob key. Never shown to users and never reused.
    pub storage_url: String,
    /// The file owner. Immutable after creation.
    pub owner_id: Uuid,
    /// The containing folder (None for root level).
    pub folder_id: Option<Uuid>,
    /// When the upload completed.
    pub upload_date: DateTime<Utc>,
    /// When the file was last opened.
    pub last_accessed: Option<DateTime<Utc>>,
    /// Thumbnail location, if one was generated.
    pub thumbnail_url: Option<String>,
    /// Whether the owner starred this file.
    pub is_favorite: bool,
    /// Set when the file is in the trash.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Who moved the file to the trash.
    pub deleted_by: Option<Uuid>,
}

impl File {
    /// Whether the file is currently in the trash.
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Display category derived from the MIME type.
    pub fn kind(&self) -> FileKind {
        FileKind::from_mime(&self.file_type)
    }

    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.filename
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.filename && !ext.is_empty())
            .map(|ext| ext.to_lowercase())
    }
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// The file owner.
    pub owner_id: Uuid,
    /// Display name.
    pub filename: String,
    /// Declared MIME type.
    pub file_type: String,
    /// File size in bytes.
    pub file_size: i64,
    /// Blob key the contents were written under.
    pub storage_url: String,
    /// Target folder (None for root level).
    pub folder_id: Option<Uuid>,
}
