//! File share entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A read-access grant on a file for a user who does not own it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileShare {
    /// Unique share identifier.
    pub id: Uuid,
    /// The shared file.
    pub file_id: Uuid,
    /// The owner who granted access.
    pub shared_by_user_id: Uuid,
    /// The recipient.
    pub shared_with_user_id: Uuid,
    /// When the grant was created.
    pub shared_date: DateTime<Utc>,
}

/// Data required to create a new share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFileShare {
    /// The shared file.
    pub file_id: Uuid,
    /// The owner granting access.
    pub shared_by_user_id: Uuid,
    /// The recipient.
    pub shared_with_user_id: Uuid,
}
