//! File share repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use grutto_core::result::AppResult;
use grutto_entity::share::{CreateFileShare, FileShare};

use crate::error::db_error;
use crate::traits::ShareStore;

/// Repository for file share rows.
#[derive(Debug, Clone)]
pub struct ShareRepository {
    pool: PgPool,
}

impl ShareRepository {
    /// Create a new share repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareStore for ShareRepository {
    async fn create_many(&self, inputs: &[CreateFileShare]) -> AppResult<Vec<FileShare>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = inputs.iter().map(|_| Uuid::now_v7()).collect();
        let file_ids: Vec<Uuid> = inputs.iter().map(|s| s.file_id).collect();
        let sharers: Vec<Uuid> = inputs.iter().map(|s| s.shared_by_user_id).collect();
        let recipients: Vec<Uuid> = inputs.iter().map(|s| s.shared_with_user_id).collect();

        sqlx::query_as::<_, FileShare>(
            "INSERT INTO file_shares (id, file_id, shared_by_user_id, shared_with_user_id) \
             SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::uuid[], $4::uuid[]) \
             ON CONFLICT (file_id, shared_with_user_id) DO NOTHING \
             RETURNING *",
        )
        .bind(&ids)
        .bind(&file_ids)
        .bind(&sharers)
        .bind(&recipients)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to create file shares"))
    }

    async fn find_by_file(&self, file_id: Uuid) -> AppResult<Vec<FileShare>> {
        sqlx::query_as::<_, FileShare>(
            "SELECT * FROM file_shares WHERE file_id = $1 ORDER BY shared_date ASC, id ASC",
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list file shares"))
    }

    async fn find(&self, file_id: Uuid, user_id: Uuid) -> AppResult<Option<FileShare>> {
        sqlx::query_as::<_, FileShare>(
            "SELECT * FROM file_shares WHERE file_id = $1 AND shared_with_user_id = $2",
        )
        .bind(file_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find file share"))
    }

    async fn delete(&self, file_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM file_shares WHERE file_id = $1 AND shared_with_user_id = $2")
                .bind(file_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(db_error("Failed to revoke file share"))?;
        Ok(result.rows_affected() > 0)
    }
}
