//! Mapping from sqlx errors into [`AppError`].

use grutto_core::error::{AppError, ErrorKind};

/// Build a mapper that wraps a sqlx error with `context`.
///
/// Unique violations become `Conflict`, row decode failures become
/// `Serialization` and pool exhaustion becomes `ServiceUnavailable`.
/// Everything else is a `Database` error.
pub fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |err| {
        let kind = match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => ErrorKind::Conflict,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                ErrorKind::Serialization
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => ErrorKind::ServiceUnavailable,
            _ => ErrorKind::Database,
        };
        AppError::with_source(kind, format!("{context}: {err}"), err)
    }
}
