//! Local storage provider traits.
//!
//! These contracts are implemented by concrete storage backends
//! (PostgreSQL, in-memory). The local/proxy identity manager and the
//! claims enrichment service are written against them, never against a
//! specific backend.
//!
//! Implementations must be thread-safe and support concurrent access.

use async_trait::async_trait;
use uuid::Uuid;

use bms_model::{AppSetting, Group, Role, User};

use crate::error::StoreResult;

/// Provider for local user identity storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Lists all users.
    async fn all(&self) -> StoreResult<Vec<User>>;

    /// Gets a user by subject id.
    async fn by_id(&self, user_id: &str) -> StoreResult<Option<User>>;

    /// Gets a user by username.
    async fn by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Gets a user by email. Email is not unique; the first match wins.
    async fn by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Creates a new user.
    ///
    /// ## Errors
    ///
    /// Returns [`StoreError::Duplicate`](crate::StoreError::Duplicate) if
    /// the subject id or username already exists.
    async fn create(&self, user: &User) -> StoreResult<()>;

    /// Updates an existing user.
    ///
    /// ## Errors
    ///
    /// Returns [`StoreError::NotFound`](crate::StoreError::NotFound) if the
    /// user doesn't exist.
    async fn update(&self, user: &User) -> StoreResult<()>;

    /// Deletes a user. Returns `Ok(false)` if the user is unknown.
    async fn delete(&self, user_id: &str) -> StoreResult<bool>;

    /// Creates the user if absent, otherwise updates its profile fields and
    /// refreshes the last-login timestamp. Returns the stored record.
    async fn upsert(&self, user: &User) -> StoreResult<User>;
}

/// Provider for role storage and role assignment edges.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Creates a new role.
    ///
    /// ## Errors
    ///
    /// Returns [`StoreError::Duplicate`](crate::StoreError::Duplicate) if a
    /// role with the same name exists.
    async fn create(&self, role: &Role) -> StoreResult<()>;

    /// Gets a role by id.
    async fn by_id(&self, id: Uuid) -> StoreResult<Option<Role>>;

    /// Gets a role by its unique name.
    async fn by_name(&self, name: &str) -> StoreResult<Option<Role>>;

    /// Lists all roles.
    async fn all(&self) -> StoreResult<Vec<Role>>;

    /// Gets the roles directly assigned to a user.
    async fn by_user(&self, user_id: &str) -> StoreResult<Vec<Role>>;

    /// Gets the roles assigned to the group with the given path.
    ///
    /// Group-role inheritance is keyed by path: the group's current path is
    /// resolved first and roles are looked up through it.
    async fn by_group_path(&self, path: &str) -> StoreResult<Vec<Role>>;

    /// Gets the ids of the users directly assigned to a role.
    async fn user_ids_in_role(&self, role_id: Uuid) -> StoreResult<Vec<String>>;

    /// Updates an existing role.
    ///
    /// ## Errors
    ///
    /// Returns [`StoreError::NotFound`](crate::StoreError::NotFound) if the
    /// role doesn't exist.
    async fn update(&self, role: &Role) -> StoreResult<()>;

    /// Deletes a role together with its user-role and group-role edges.
    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    /// Adds a user-role edge. Adding an existing edge is a no-op.
    async fn add_user(&self, user_id: &str, role_id: Uuid) -> StoreResult<()>;

    /// Removes a user-role edge. Removing a missing edge is a no-op.
    async fn remove_user(&self, user_id: &str, role_id: Uuid) -> StoreResult<()>;

    /// Adds a group-role edge. Adding an existing edge is a no-op.
    async fn assign_group(&self, group_id: Uuid, role_id: Uuid) -> StoreResult<()>;

    /// Removes a group-role edge. Removing a missing edge is a no-op.
    async fn remove_group(&self, group_id: Uuid, role_id: Uuid) -> StoreResult<()>;
}

/// Provider for hierarchical group storage and membership edges.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Creates a new group.
    ///
    /// ## Errors
    ///
    /// Returns [`StoreError::Duplicate`](crate::StoreError::Duplicate) if a
    /// group with the same path exists.
    async fn create(&self, group: &Group) -> StoreResult<()>;

    /// Gets a group by id.
    async fn by_id(&self, id: Uuid) -> StoreResult<Option<Group>>;

    /// Gets a group by its unique path.
    async fn by_path(&self, path: &str) -> StoreResult<Option<Group>>;

    /// Lists all groups as a flat collection.
    async fn all(&self) -> StoreResult<Vec<Group>>;

    /// Gets the groups a user belongs to.
    async fn by_user(&self, user_id: &str) -> StoreResult<Vec<Group>>;

    /// Gets the ids of the users belonging to a group.
    async fn user_ids_in_group(&self, group_id: Uuid) -> StoreResult<Vec<String>>;

    /// Updates an existing group.
    ///
    /// ## Errors
    ///
    /// Returns [`StoreError::NotFound`](crate::StoreError::NotFound) if the
    /// group doesn't exist.
    async fn update(&self, group: &Group) -> StoreResult<()>;

    /// Deletes a group and its whole descendant subtree, removing all
    /// membership and group-role edges for the subtree first. Groups are
    /// deleted deepest path first to satisfy referential constraints.
    ///
    /// Deleting an unknown group is a no-op.
    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    /// Adds a user-group edge. Adding an existing edge is a no-op.
    async fn add_user(&self, user_id: &str, group_id: Uuid) -> StoreResult<()>;

    /// Removes a user-group edge. Removing a missing edge is a no-op.
    async fn remove_user(&self, user_id: &str, group_id: Uuid) -> StoreResult<()>;
}

/// Provider for persisted application settings.
#[async_trait]
pub trait SettingStore: Send + Sync {
    /// Gets a setting by key.
    async fn get(&self, key: &str) -> StoreResult<Option<AppSetting>>;

    /// Creates or updates a setting.
    async fn set(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> StoreResult<AppSetting>;

    /// Deletes a setting. Returns `Ok(false)` if the key is unknown.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Reads a boolean setting, falling back to `default` when the key is
    /// absent or the value doesn't parse.
    async fn get_bool(&self, key: &str, default: bool) -> StoreResult<bool> {
        Ok(self
            .get(key)
            .await?
            .and_then(|s| s.as_bool())
            .unwrap_or(default))
    }
}
