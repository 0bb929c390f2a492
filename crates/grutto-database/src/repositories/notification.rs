//! Notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use grutto_core::result::AppResult;
use grutto_entity::notification::{CreateNotification, Notification, NotificationType};

use crate::error::db_error;
use crate::traits::NotificationStore;

/// Repository for notification rows.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn create(&self, input: &CreateNotification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (id, recipient_id, sender_id, type, file_id, message) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(input.recipient_id)
        .bind(input.sender_id)
        .bind(input.kind)
        .bind(input.file_id)
        .bind(&input.message)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create notification"))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find notification"))
    }

    async fn find_by_recipient(&self, recipient_id: Uuid) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE recipient_id = $1 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list notifications"))
    }

    async fn count_unread(&self, recipient_id: Uuid, since: DateTime<Utc>) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE recipient_id = $1 AND read_status = FALSE AND created_at >= $2",
        )
        .bind(recipient_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count unread notifications"))
    }

    async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET read_status = TRUE WHERE id = $1 AND recipient_id = $2",
        )
        .bind(id)
        .bind(recipient_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark notification read"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read_status = TRUE \
             WHERE recipient_id = $1 AND read_status = FALSE",
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark notifications read"))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid, recipient_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2")
            .bind(id)
            .bind(recipient_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete notification"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_file(&self, file_id: Uuid, kind: NotificationType) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE file_id = $1 AND type = $2")
            .bind(file_id)
            .bind(kind)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete file notifications"))?;
        Ok(result.rows_affected())
    }

    async fn delete_older_than(
        &self,
        recipient_id: Option<Uuid>,
        cutoff: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM notifications \
             WHERE created_at < $2 AND ($1::uuid IS NULL OR recipient_id = $1)",
        )
        .bind(recipient_id)
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to delete expired notifications"))?;
        Ok(result.rows_affected())
    }
}
