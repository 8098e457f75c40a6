//! `PostgreSQL` implementation of the setting store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use bms_identity::{SettingStore, StoreResult};
use bms_model::AppSetting;

use crate::entities::SettingRow;
use crate::error::from_sqlx_error;

/// `PostgreSQL` setting store.
pub struct PgSettingStore {
    pool: PgPool,
}

impl PgSettingStore {
    /// Creates a new `PostgreSQL` setting store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingStore for PgSettingStore {
    async fn get(&self, key: &str) -> StoreResult<Option<AppSetting>> {
        let row: Option<SettingRow> =
            sqlx::query_as("SELECT * FROM app_settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(from_sqlx_error)?;
        Ok(row.map(AppSetting::from))
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> StoreResult<AppSetting> {
        let row: SettingRow = sqlx::query_as(
            r"INSERT INTO app_settings (id, key, value, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NULL)
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                description = COALESCE(EXCLUDED.description, app_settings.description),
                updated_at = $5
            RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(key)
        .bind(value)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        Ok(AppSetting::from(row))
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM app_settings WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
