//! Database migration runner.

use sqlx::PgPool;
use tracing::info;

use grutto_core::error::AppError;

use crate::error::db_error;

/// Run all pending database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!("Running database migrations...");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| db_error("Failed to run migrations")(sqlx::Error::from(e)))?;

    info!("Database migrations completed successfully");
    Ok(())
}
