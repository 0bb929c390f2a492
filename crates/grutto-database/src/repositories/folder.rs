//! Folder repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_entity::folder::{CreateFolder, Folder};

use crate::error::db_error;
use crate::traits::{FolderStore, MAX_FOLDER_DEPTH};

/// Repository for folder rows.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderStore for FolderRepository {
    async fn create(&self, input: &CreateFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (id, name, color, owner_id, parent_folder_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&input.name)
        .bind(&input.color)
        .bind(input.owner_id)
        .bind(input.parent_folder_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create folder"))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find folder"))
    }

    async fn find_children(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE owner_id = $1 AND parent_folder_id IS NOT DISTINCT FROM $2 \
             ORDER BY LOWER(name) ASC, id ASC",
        )
        .bind(owner_id)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list folders"))
    }

    async fn find_all_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE owner_id = $1 ORDER BY LOWER(name) ASC, id ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list folders"))
    }

    async fn update(&self, folder: &Folder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = $2, color = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(folder.id)
        .bind(&folder.name)
        .bind(&folder.color)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update folder"))?
        .ok_or_else(|| AppError::not_found(format!("Folder {} not found", folder.id)))
    }

    async fn reparent(&self, id: Uuid, new_parent_id: Option<Uuid>) -> AppResult<Folder> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let owner_id: Option<Uuid> =
            sqlx::query_scalar("SELECT owner_id FROM folders WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("Failed to find folder"))?;
        let Some(owner_id) = owner_id else {
            return Err(AppError::not_found(format!("Folder {id} not found")));
        };

        // Two opposite moves each lock a different row, so serialize on the owner.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to lock folder hierarchy"))?;

        if let Some(parent_id) = new_parent_id {
            let (depth, hits): (Option<i64>, Option<i64>) = sqlx::query_as(
                "WITH RECURSIVE ancestors AS ( \
                     SELECT id, parent_folder_id, 1 AS depth FROM folders WHERE id = $1 \
                     UNION ALL \
                     SELECT f.id, f.parent_folder_id, a.depth + 1 \
                     FROM folders f JOIN ancestors a ON f.id = a.parent_folder_id \
                     WHERE a.depth <= $3 \
                 ) \
                 SELECT MAX(depth)::BIGINT, COUNT(*) FILTER (WHERE id = $2) FROM ancestors",
            )
            .bind(parent_id)
            .bind(id)
            .bind(MAX_FOLDER_DEPTH as i64)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to walk folder ancestry"))?;

            let depth = depth.unwrap_or(0);
            if depth == 0 {
                return Err(AppError::not_found(format!("Folder {parent_id} not found")));
            }
            if hits.unwrap_or(0) > 0 {
                return Err(AppError::validation(
                    "Cannot move a folder into one of its own subfolders",
                ));
            }
            if depth > MAX_FOLDER_DEPTH as i64 {
                return Err(AppError::internal(format!(
                    "Folder ancestry of {parent_id} is deeper than {MAX_FOLDER_DEPTH}"
                )));
            }
        }

        let folder = sqlx::query_as::<_, Folder>(
            "UPDATE folders SET parent_folder_id = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(new_parent_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to move folder"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit folder move"))?;
        Ok(folder)
    }

    async fn count_files(&self, folder_ids: &[Uuid]) -> AppResult<HashMap<Uuid, u64>> {
        if folder_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT folder_id, COUNT(*) FROM files \
             WHERE folder_id = ANY($1) AND deleted_at IS NULL \
             GROUP BY folder_id",
        )
        .bind(folder_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to count folder files"))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.max(0) as u64))
            .collect())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let parent: Option<Option<Uuid>> =
            sqlx::query_scalar("SELECT parent_folder_id FROM folders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("Failed to find folder"))?;
        let Some(parent) = parent else {
            return Err(AppError::not_found(format!("Folder {id} not found")));
        };

        sqlx::query("UPDATE files SET folder_id = NULL WHERE folder_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to move folder files to root"))?;

        sqlx::query(
            "UPDATE folders SET parent_folder_id = $2, updated_at = NOW() \
             WHERE parent_folder_id = $1",
        )
        .bind(id)
        .bind(parent)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to reparent child folders"))?;

        sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete folder"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit folder delete"))
    }
}
