//! Profile repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_entity::profile::{CreateProfile, Profile};

use crate::error::db_error;
use crate::traits::ProfileStore;

/// Repository for profile rows.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Create a new profile repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn create(&self, input: &CreateProfile) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>(
            "INSERT INTO profiles (id, username, display_name, email) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(input.id)
        .bind(&input.username)
        .bind(&input.display_name)
        .bind(&input.email)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create profile"))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Profile>> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find profile"))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to load profiles"))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Profile>> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find profile by username"))
    }

    async fn search_by_username_prefix(
        &self,
        prefix: &str,
        exclude: &[Uuid],
        limit: i64,
    ) -> AppResult<Vec<Profile>> {
        let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
        sqlx::query_as::<_, Profile>(
            "SELECT * FROM profiles \
             WHERE LOWER(username) LIKE $1 ESCAPE '\\' AND NOT (id = ANY($2)) \
             ORDER BY username ASC LIMIT $3",
        )
        .bind(pattern)
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to search profiles"))
    }

    async fn update_display_name(
        &self,
        id: Uuid,
        display_name: Option<&str>,
    ) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>(
            "UPDATE profiles SET display_name = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(display_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update display name"))?
        .ok_or_else(|| AppError::not_found(format!("Profile {id} not found")))
    }

    async fn update_picture_url(&self, id: Uuid, url: Option<&str>) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>(
            "UPDATE profiles SET profile_picture_url = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update profile picture"))?
        .ok_or_else(|| AppError::not_found(format!("Profile {id} not found")))
    }

    async fn adjust_storage_used(&self, id: Uuid, delta: i64) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE profiles SET storage_used = GREATEST(storage_used + $2, 0) WHERE id = $1",
        )
        .bind(id)
        .bind(delta)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update storage usage"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Profile {id} not found")));
        }
        Ok(())
    }
}

/// Escape `%`, `_` and `\` so user input matches literally in a LIKE pattern.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
