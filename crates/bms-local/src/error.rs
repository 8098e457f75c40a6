//! SQL error translation.

use bms_identity::StoreError;
use sqlx::Error as SqlxError;

/// Converts a `SQLx` error to a storage error.
pub fn from_sqlx_error(err: SqlxError) -> StoreError {
    match err {
        SqlxError::RowNotFound => StoreError::Internal("row not found".to_string()),
        SqlxError::Database(db_err) => {
            if db_err.code().is_some_and(|c| c == "23503") {
                StoreError::Query(format!("reference violation: {}", db_err.message()))
            } else {
                StoreError::Query(db_err.to_string())
            }
        }
        SqlxError::PoolTimedOut => StoreError::Connection("connection pool timeout".to_string()),
        SqlxError::PoolClosed => StoreError::Connection("connection pool closed".to_string()),
        _ => StoreError::Internal(err.to_string()),
    }
}

/// Converts a `SQLx` error to a storage error, mapping a unique-constraint
/// violation (PostgreSQL error code 23505) to the given duplicate error.
pub fn unique_or(err: SqlxError, duplicate: StoreError) -> StoreError {
    match &err {
        SqlxError::Database(db_err) if db_err.code().is_some_and(|c| c == "23505") => duplicate,
        _ => from_sqlx_error(err),
    }
}
