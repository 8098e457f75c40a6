//! `PostgreSQL` implementation of the user store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use bms_identity::{StoreError, StoreResult, UserStore};
use bms_model::User;

use crate::entities::UserRow;
use crate::error::{from_sqlx_error, unique_or};

/// `PostgreSQL` user store.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Creates a new `PostgreSQL` user store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn all(&self) -> StoreResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM local_users ORDER BY username")
            .fetch_all(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn by_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM local_users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(row.map(User::from))
    }

    async fn by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT * FROM local_users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(from_sqlx_error)?;
        Ok(row.map(User::from))
    }

    async fn by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT * FROM local_users WHERE email = $1 ORDER BY created_at LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(from_sqlx_error)?;
        Ok(row.map(User::from))
    }

    async fn create(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r"INSERT INTO local_users (
                id, username, email, first_name, last_name, organization,
                enabled, created_at, updated_at, last_login_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.organization)
        .bind(user.enabled)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.last_login_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or(e, StoreError::duplicate("User", "username", &user.username)))?;

        Ok(())
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(
            r"UPDATE local_users SET
                username = $2, email = $3, first_name = $4, last_name = $5,
                organization = $6, enabled = $7, updated_at = $8, last_login_at = $9
            WHERE id = $1",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.organization)
        .bind(user.enabled)
        .bind(user.updated_at)
        .bind(user.last_login_at)
        .execute(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("User", &user.id));
        }
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM local_users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert(&self, user: &User) -> StoreResult<User> {
        let now = Utc::now();
        let row: UserRow = sqlx::query_as(
            r"INSERT INTO local_users (
                id, username, email, first_name, last_name, organization,
                enabled, created_at, updated_at, last_login_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NULL, $9)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                email = EXCLUDED.email,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                organization = EXCLUDED.organization,
                updated_at = $9,
                last_login_at = $9
            RETURNING *",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.organization)
        .bind(user.enabled)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        Ok(User::from(row))
    }
}
