//! `PostgreSQL` implementation of the role store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use bms_identity::{RoleStore, StoreError, StoreResult};
use bms_model::Role;

use crate::entities::RoleRow;
use crate::error::{from_sqlx_error, unique_or};

/// `PostgreSQL` role store.
pub struct PgRoleStore {
    pool: PgPool,
}

impl PgRoleStore {
    /// Creates a new `PostgreSQL` role store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleStore for PgRoleStore {
    async fn create(&self, role: &Role) -> StoreResult<()> {
        sqlx::query(
            r"INSERT INTO local_roles (id, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.created_at)
        .bind(role.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or(e, StoreError::duplicate("Role", "name", &role.name)))?;

        Ok(())
    }

    async fn by_id(&self, id: Uuid) -> StoreResult<Option<Role>> {
        let row: Option<RoleRow> = sqlx::query_as("SELECT * FROM local_roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(row.map(Role::from))
    }

    async fn by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        let row: Option<RoleRow> = sqlx::query_as("SELECT * FROM local_roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(row.map(Role::from))
    }

    async fn all(&self) -> StoreResult<Vec<Role>> {
        let rows: Vec<RoleRow> = sqlx::query_as("SELECT * FROM local_roles ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn by_user(&self, user_id: &str) -> StoreResult<Vec<Role>> {
        let rows: Vec<RoleRow> = sqlx::query_as(
            r"SELECT r.* FROM local_roles r
            JOIN local_user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(from_sqlx_error)?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn by_group_path(&self, path: &str) -> StoreResult<Vec<Role>> {
        let rows: Vec<RoleRow> = sqlx::query_as(
            r"SELECT r.* FROM local_roles r
            JOIN local_group_roles gr ON gr.role_id = r.id
            JOIN local_groups g ON g.id = gr.group_id
            WHERE g.path = $1
            ORDER BY r.name",
        )
        .bind(path)
        .fetch_all(&self.pool)
        .await
        .map_err(from_sqlx_error)?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn user_ids_in_role(&self, role_id: Uuid) -> StoreResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT user_id FROM local_user_roles WHERE role_id = $1")
                .bind(role_id)
                .fetch_all(&self.pool)
                .await
                .map_err(from_sqlx_error)?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn update(&self, role: &Role) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE local_roles SET name = $2, description = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or(e, StoreError::duplicate("Role", "name", &role.name)))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Role", role.id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        // Remove assignment edges before the role itself.
        sqlx::query("DELETE FROM local_user_roles WHERE role_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        sqlx::query("DELETE FROM local_group_roles WHERE role_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        sqlx::query("DELETE FROM local_roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(())
    }

    async fn add_user(&self, user_id: &str, role_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            r"INSERT INTO local_user_roles (user_id, role_id, created_at)
            VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(from_sqlx_error)?;
        Ok(())
    }

    async fn remove_user(&self, user_id: &str, role_id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM local_user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(())
    }

    async fn assign_group(&self, group_id: Uuid, role_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            r"INSERT INTO local_group_roles (group_id, role_id, created_at)
            VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(group_id)
        .bind(role_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(from_sqlx_error)?;
        Ok(())
    }

    async fn remove_group(&self, group_id: Uuid, role_id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM local_group_roles WHERE group_id = $1 AND role_id = $2")
            .bind(group_id)
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(())
    }
}
