//! Schema bootstrap for the local identity tables.

use bms_identity::StoreResult;
use sqlx::PgPool;

use crate::error::from_sqlx_error;

/// DDL statements, applied in order. Uniqueness constraints: role name,
/// group path, username and setting key are unique; email carries a
/// non-unique index.
const STATEMENTS: &[&str] = &[
    r"CREATE TABLE IF NOT EXISTS local_users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        organization TEXT NOT NULL,
        enabled BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ,
        last_login_at TIMESTAMPTZ NOT NULL
    )",
    r"CREATE INDEX IF NOT EXISTS idx_local_users_email ON local_users (email)",
    r"CREATE TABLE IF NOT EXISTS local_roles (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ
    )",
    r"CREATE TABLE IF NOT EXISTS local_groups (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        path TEXT NOT NULL UNIQUE,
        parent_id UUID REFERENCES local_groups (id),
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ
    )",
    r"CREATE TABLE IF NOT EXISTS local_user_roles (
        user_id TEXT NOT NULL,
        role_id UUID NOT NULL REFERENCES local_roles (id),
        created_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (user_id, role_id)
    )",
    r"CREATE TABLE IF NOT EXISTS local_user_groups (
        user_id TEXT NOT NULL,
        group_id UUID NOT NULL REFERENCES local_groups (id),
        created_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (user_id, group_id)
    )",
    r"CREATE TABLE IF NOT EXISTS local_group_roles (
        group_id UUID NOT NULL REFERENCES local_groups (id),
        role_id UUID NOT NULL REFERENCES local_roles (id),
        created_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (group_id, role_id)
    )",
    r"CREATE TABLE IF NOT EXISTS app_settings (
        id UUID PRIMARY KEY,
        key TEXT NOT NULL UNIQUE,
        value TEXT NOT NULL,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ
    )",
];

/// Creates the local identity tables if they don't exist.
///
/// ## Errors
///
/// Returns an error if any DDL statement fails.
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(from_sqlx_error)?;
    }
    tracing::debug!("local identity schema is up to date");
    Ok(())
}
