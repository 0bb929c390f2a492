//! File repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_entity::file::{CreateFile, File};

use crate::error::db_error;
use crate::traits::FileStore;

/// Repository for file rows.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Explain why a guarded state transition matched no row.
    async fn transition_failure(&self, id: Uuid, expected: &str) -> AppError {
        match self.find_by_id(id).await {
            Ok(Some(_)) => AppError::conflict(format!("File {id} is not {expected}")),
            Ok(None) => AppError::not_found(format!("File {id} not found")),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl FileStore for FileRepository {
    async fn create(&self, input: &CreateFile) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files (id, filename, file_type, file_size, storage_url, owner_id, folder_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&input.filename)
        .bind(&input.file_type)
        .bind(input.file_size)
        .bind(&input.storage_url)
        .bind(input.owner_id)
        .bind(input.folder_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create file"))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find file"))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<File>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to load files"))
    }

    async fn find_root_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files \
             WHERE owner_id = $1 AND deleted_at IS NULL \
               AND (folder_id IS NULL \
                    OR NOT EXISTS (SELECT 1 FROM folders d WHERE d.id = files.folder_id)) \
             ORDER BY upload_date DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list owned files"))
    }

    async fn find_recent_by_owner(&self, owner_id: Uuid, limit: i64) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE owner_id = $1 AND deleted_at IS NULL \
             ORDER BY upload_date DESC, id DESC LIMIT $2",
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list recent files"))
    }

    async fn find_by_folder(&self, folder_id: Uuid) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE folder_id = $1 AND deleted_at IS NULL \
             ORDER BY upload_date DESC, id DESC",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list folder files"))
    }

    async fn find_shared_with(&self, user_id: Uuid, limit: Option<i64>) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT f.* FROM files f \
             JOIN file_shares s ON s.file_id = f.id \
             WHERE s.shared_with_user_id = $1 AND f.deleted_at IS NULL \
             ORDER BY f.upload_date DESC, f.id DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list shared files"))
    }

    async fn find_favorites(&self, owner_id: Uuid) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files \
             WHERE owner_id = $1 AND is_favorite = TRUE AND deleted_at IS NULL \
             ORDER BY upload_date DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list favorite files"))
    }

    async fn find_trashed(&self, owner_id: Uuid) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE owner_id = $1 AND deleted_at IS NOT NULL \
             ORDER BY deleted_at DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list trashed files"))
    }

    async fn rename(&self, id: Uuid, filename: &str) -> AppResult<File> {
        sqlx::query_as::<_, File>("UPDATE files SET filename = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(filename)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to rename file"))?
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
    }

    async fn set_folder(&self, id: Uuid, folder_id: Option<Uuid>) -> AppResult<File> {
        sqlx::query_as::<_, File>("UPDATE files SET folder_id = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(folder_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to move file"))?
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
    }

    async fn set_favorite(&self, id: Uuid, is_favorite: bool) -> AppResult<File> {
        sqlx::query_as::<_, File>("UPDATE files SET is_favorite = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(is_favorite)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update favorite"))?
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE files SET last_accessed = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to record file access"))?;
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid, deleted_by: Uuid) -> AppResult<File> {
        let trashed = sqlx::query_as::<_, File>(
            "UPDATE files SET deleted_at = NOW(), deleted_by = $2 \
             WHERE id = $1 AND deleted_at IS NULL RETURNING *",
        )
        .bind(id)
        .bind(deleted_by)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to move file to trash"))?;

        match trashed {
            Some(file) => Ok(file),
            None => Err(self.transition_failure(id, "active").await),
        }
    }

    async fn restore(&self, id: Uuid) -> AppResult<File> {
        let restored = sqlx::query_as::<_, File>(
            "UPDATE files SET deleted_at = NULL, deleted_by = NULL \
             WHERE id = $1 AND deleted_at IS NOT NULL RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to restore file"))?;

        match restored {
            Some(file) => Ok(file),
            None => Err(self.transition_failure(id, "in the trash").await),
        }
    }

    async fn purge(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        sqlx::query("DELETE FROM notifications WHERE file_id = $1 AND type = 'file_deleted'")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete trash notification"))?;

        sqlx::query("UPDATE notifications SET file_id = NULL WHERE file_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to detach notifications"))?;

        sqlx::query("DELETE FROM file_shares WHERE file_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete file shares"))?;

        let deleted = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete file"))?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::not_found(format!("File {id} not found")));
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit file purge"))
    }
}
