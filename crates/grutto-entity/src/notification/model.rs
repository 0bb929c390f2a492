//! Notification entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::NotificationType;

/// A notification delivered to a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// The user who sees the notification.
    pub recipient_id: Uuid,
    /// The user whose action produced it.
    pub sender_id: Uuid,
    /// Event type.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,
    /// The file involved, if any. Not a cascading reference.
    pub file_id: Option<Uuid>,
    /// Display text.
    pub message: String,
    /// Whether the recipient has read it.
    pub read_status: bool,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Whether the notification is past the retention window at `now`.
    pub fn is_expired(&self, retention_days: i64, now: DateTime<Utc>) -> bool {
        self.created_at < now - Duration::days(retention_days)
    }
}

/// Data required to create a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNotification {
    /// Recipient.
    pub recipient_id: Uuid,
    /// Sender.
    pub sender_id: Uuid,
    /// Event type.
    pub kind: NotificationType,
    /// Involved file.
    pub file_id: Option<Uuid>,
    /// Display text.
    pub message: String,
}

impl CreateNotification {
    /// Tell `recipient_id` that `sender_name` shared `filename` with them.
    pub fn file_shared(
        recipient_id: Uuid,
        sender_id: Uuid,
        sender_name: &str,
        file_id: Uuid,
        filename: &str,
    ) -> Self {
        Self {
            recipient_id,
            sender_id,
            kind: NotificationType::FileShared,
            file_id: Some(file_id),
            message: format!("{sender_name} shared \"{filename}\" with you"),
        }
    }

    /// Self-notification recording that an owner trashed a file.
    pub fn file_deleted(owner_id: Uuid, file_id: Uuid, filename: &str) -> Self {
        Self {
            recipient_id: owner_id,
            sender_id: owner_id,
            kind: NotificationType::FileDeleted,
            file_id: Some(file_id),
            message: format!("\"{filename}\" was moved to trash"),
        }
    }

    /// Self-notification recording that an owner deleted a folder.
    pub fn folder_deleted(owner_id: Uuid, folder_name: &str) -> Self {
        Self {
            recipient_id: owner_id,
            sender_id: owner_id,
            kind: NotificationType::FolderDeleted,
            file_id: None,
            message: format!("Folder \"{folder_name}\" was deleted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_shared_message() {
        let n = CreateNotification::file_shared(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "alice",
            Uuid::new_v4(),
            "notes.pdf",
        );
        assert_eq!(n.message, "alice shared \"notes.pdf\" with you");
        assert_eq!(n.kind, NotificationType::FileShared);
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let n = Notification {
            id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            kind: NotificationType::FileDeleted,
            file_id: None,
            message: String::new(),
            read_status: false,
            created_at: now - Duration::days(31),
        };
        assert!(n.is_expired(30, now));
        assert!(!n.is_expired(45, now));
    }
}
