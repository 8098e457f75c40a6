//! `PostgreSQL` implementation of the group store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use bms_identity::{GroupStore, StoreError, StoreResult};
use bms_model::{group::collect_subtree, Group};

use crate::entities::GroupRow;
use crate::error::{from_sqlx_error, unique_or};

/// `PostgreSQL` group store.
pub struct PgGroupStore {
    pool: PgPool,
}

impl PgGroupStore {
    /// Creates a new `PostgreSQL` group store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupStore for PgGroupStore {
    async fn create(&self, group: &Group) -> StoreResult<()> {
        sqlx::query(
            r"INSERT INTO local_groups (id, name, path, parent_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(group.id)
        .bind(&group.name)
        .bind(&group.path)
        .bind(group.parent_id)
        .bind(group.created_at)
        .bind(group.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or(e, StoreError::duplicate("Group", "path", &group.path)))?;

        Ok(())
    }

    async fn by_id(&self, id: Uuid) -> StoreResult<Option<Group>> {
        let row: Option<GroupRow> = sqlx::query_as("SELECT * FROM local_groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(row.map(Group::from))
    }

    async fn by_path(&self, path: &str) -> StoreResult<Option<Group>> {
        let row: Option<GroupRow> =
            sqlx::query_as("SELECT * FROM local_groups WHERE path = $1")
                .bind(path)
                .fetch_optional(&self.pool)
                .await
                .map_err(from_sqlx_error)?;
        Ok(row.map(Group::from))
    }

    async fn all(&self) -> StoreResult<Vec<Group>> {
        let rows: Vec<GroupRow> = sqlx::query_as("SELECT * FROM local_groups ORDER BY path")
            .fetch_all(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(rows.into_iter().map(Group::from).collect())
    }

    async fn by_user(&self, user_id: &str) -> StoreResult<Vec<Group>> {
        let rows: Vec<GroupRow> = sqlx::query_as(
            r"SELECT g.* FROM local_groups g
            JOIN local_user_groups ug ON ug.group_id = g.id
            WHERE ug.user_id = $1
            ORDER BY g.path",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(from_sqlx_error)?;
        Ok(rows.into_iter().map(Group::from).collect())
    }

    async fn user_ids_in_group(&self, group_id: Uuid) -> StoreResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT user_id FROM local_user_groups WHERE group_id = $1")
                .bind(group_id)
                .fetch_all(&self.pool)
                .await
                .map_err(from_sqlx_error)?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn update(&self, group: &Group) -> StoreResult<()> {
        let result = sqlx::query(
            r"UPDATE local_groups SET name = $2, path = $3, parent_id = $4, updated_at = $5
            WHERE id = $1",
        )
        .bind(group.id)
        .bind(&group.name)
        .bind(&group.path)
        .bind(group.parent_id)
        .bind(group.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or(e, StoreError::duplicate("Group", "path", &group.path)))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Group", group.id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        // One flat query; the subtree is collected in memory to avoid
        // per-node round-trips.
        let all = self.all().await?;
        let subtree = collect_subtree(&all, id);
        if subtree.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = subtree.iter().map(|g| g.id).collect();

        sqlx::query("DELETE FROM local_user_groups WHERE group_id = ANY($1)")
            .bind(&ids)
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        sqlx::query("DELETE FROM local_group_roles WHERE group_id = ANY($1)")
            .bind(&ids)
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        // `collect_subtree` yields deepest paths first, so children go
        // before their parents.
        for group in &subtree {
            sqlx::query("DELETE FROM local_groups WHERE id = $1")
                .bind(group.id)
                .execute(&self.pool)
                .await
                .map_err(from_sqlx_error)?;
        }

        tracing::debug!(group_id = %id, deleted = subtree.len(), "deleted group subtree");
        Ok(())
    }

    async fn add_user(&self, user_id: &str, group_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            r"INSERT INTO local_user_groups (user_id, group_id, created_at)
            VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(group_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(from_sqlx_error)?;
        Ok(())
    }

    async fn remove_user(&self, user_id: &str, group_id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM local_user_groups WHERE user_id = $1 AND group_id = $2")
            .bind(user_id)
            .bind(group_id)
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(())
    }
}
