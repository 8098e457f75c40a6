//! Identity manager capability traits.
//!
//! Seven narrow contracts, one per concern, each independently
//! implementable. [`IdentityManager`] is their union and the only interface
//! exposed to the rest of the application. Callers that only need, say,
//! role listing should depend on [`RoleManagement`] alone.
//!
//! All operations are async and cancel promptly when their future is
//! dropped. Lookups surface absence as `Ok(None)` / `Ok(false)` / empty
//! collections, never as an error.

use async_trait::async_trait;

use crate::error::IdentityResult;
use crate::types::{
    CredentialRepresentation, GroupRepresentation, RoleRepresentation, UserRepresentation,
};

/// User management operations.
#[async_trait]
pub trait UserManagement: Send + Sync {
    /// Whether this backend supports direct user creation.
    fn supports_user_creation(&self) -> bool;

    /// Lists all users.
    async fn users(&self) -> IdentityResult<Vec<UserRepresentation>>;

    /// Gets a user by id.
    async fn user_by_id(&self, user_id: &str) -> IdentityResult<Option<UserRepresentation>>;

    /// Gets a user by username.
    async fn user_by_username(
        &self,
        username: &str,
    ) -> IdentityResult<Option<UserRepresentation>>;

    /// Creates a new user with an initial password.
    ///
    /// ## Errors
    ///
    /// Returns an error if the backend call fails; `Ok(false)` is reserved
    /// for well-formed requests the backend declined.
    async fn create_user(
        &self,
        user: &UserRepresentation,
        password: &str,
    ) -> IdentityResult<bool>;

    /// Updates an existing user. Returns `Ok(false)` if the user is unknown.
    async fn update_user(
        &self,
        user_id: &str,
        user: &UserRepresentation,
    ) -> IdentityResult<bool>;

    /// Deletes a user. Returns `Ok(false)` if the user is unknown.
    async fn delete_user(&self, user_id: &str) -> IdentityResult<bool>;

    /// Resets a user's password. Returns `Ok(false)` if the user is unknown.
    async fn reset_password(
        &self,
        user_id: &str,
        credential: &CredentialRepresentation,
    ) -> IdentityResult<bool>;
}

/// Role management operations.
#[async_trait]
pub trait RoleManagement: Send + Sync {
    /// Whether this backend supports direct role creation.
    fn supports_direct_role_creation(&self) -> bool;

    /// Lists all roles.
    async fn roles(&self) -> IdentityResult<Vec<RoleRepresentation>>;

    /// Gets a role by id. A malformed id is treated as not found.
    async fn role_by_id(&self, role_id: &str) -> IdentityResult<Option<RoleRepresentation>>;

    /// Gets a role by its unique name.
    async fn role_by_name(&self, name: &str) -> IdentityResult<Option<RoleRepresentation>>;

    /// Creates a new role and returns it with its assigned identifier.
    ///
    /// ## Errors
    ///
    /// Returns [`IdentityError::Unsupported`](crate::IdentityError::Unsupported)
    /// on backends that cannot create roles directly.
    async fn create_role(&self, role: &RoleRepresentation)
        -> IdentityResult<RoleRepresentation>;

    /// Updates a role. Returns `Ok(false)` if the role is unknown.
    async fn update_role(
        &self,
        role_id: &str,
        role: &RoleRepresentation,
    ) -> IdentityResult<bool>;

    /// Deletes a role. Returns `Ok(false)` if the role id is malformed.
    async fn delete_role(&self, role_id: &str) -> IdentityResult<bool>;
}

/// User-to-role assignment operations.
#[async_trait]
pub trait UserRoleManagement: Send + Sync {
    /// Assigns roles to a user. Unknown or malformed role ids are skipped.
    async fn assign_roles_to_user(
        &self,
        user_id: &str,
        role_ids: &[String],
    ) -> IdentityResult<bool>;

    /// Removes roles from a user. Unknown or malformed role ids are skipped.
    async fn remove_roles_from_user(
        &self,
        user_id: &str,
        role_ids: &[String],
    ) -> IdentityResult<bool>;

    /// Gets the roles directly assigned to a user.
    async fn user_roles(&self, user_id: &str) -> IdentityResult<Vec<RoleRepresentation>>;

    /// Gets the distinct users holding a role.
    async fn users_in_role(&self, role_id: &str) -> IdentityResult<Vec<UserRepresentation>>;
}

/// Group management operations.
#[async_trait]
pub trait GroupManagement: Send + Sync {
    /// Whether this backend supports direct group creation.
    fn supports_direct_group_creation(&self) -> bool;

    /// Lists all groups as a hierarchy (top-level groups with nested
    /// children).
    async fn groups(&self) -> IdentityResult<Vec<GroupRepresentation>>;

    /// Gets a group by id. A malformed id is treated as not found.
    async fn group_by_id(&self, group_id: &str)
        -> IdentityResult<Option<GroupRepresentation>>;

    /// Gets a group by its unique path.
    async fn group_by_path(&self, path: &str) -> IdentityResult<Option<GroupRepresentation>>;

    /// Creates a new group and returns it with its assigned identifier and
    /// computed path.
    ///
    /// ## Errors
    ///
    /// Returns [`IdentityError::Unsupported`](crate::IdentityError::Unsupported)
    /// on backends that cannot create groups directly.
    async fn create_group(
        &self,
        group: &GroupRepresentation,
    ) -> IdentityResult<GroupRepresentation>;

    /// Updates a group. Returns `Ok(false)` if the group is unknown.
    async fn update_group(
        &self,
        group_id: &str,
        group: &GroupRepresentation,
    ) -> IdentityResult<bool>;

    /// Deletes a group and its whole descendant subtree.
    /// Returns `Ok(false)` if the group id is malformed.
    async fn delete_group(&self, group_id: &str) -> IdentityResult<bool>;
}

/// User-to-group membership operations.
#[async_trait]
pub trait UserGroupManagement: Send + Sync {
    /// Adds a user to the given groups. Malformed group ids are skipped.
    async fn assign_user_to_groups(
        &self,
        user_id: &str,
        group_ids: &[String],
    ) -> IdentityResult<bool>;

    /// Removes a user from the given groups. Malformed group ids are skipped.
    async fn remove_user_from_groups(
        &self,
        user_id: &str,
        group_ids: &[String],
    ) -> IdentityResult<bool>;

    /// Gets the ids of the groups a user belongs to.
    async fn user_groups(&self, user_id: &str) -> IdentityResult<Vec<String>>;

    /// Gets the distinct users belonging to a group.
    async fn users_in_group(&self, group_id: &str)
        -> IdentityResult<Vec<UserRepresentation>>;
}

/// Group-to-role assignment operations.
#[async_trait]
pub trait GroupRoleManagement: Send + Sync {
    /// Gets the roles assigned to a group.
    async fn group_roles(&self, group_id: &str) -> IdentityResult<Vec<RoleRepresentation>>;

    /// Assigns roles to a group. Malformed role ids are skipped.
    async fn assign_roles_to_group(
        &self,
        group_id: &str,
        role_ids: &[String],
    ) -> IdentityResult<bool>;

    /// Removes roles from a group. Malformed role ids are skipped.
    async fn remove_roles_from_group(
        &self,
        group_id: &str,
        role_ids: &[String],
    ) -> IdentityResult<bool>;
}

/// Bulk synchronization with external identity providers.
#[async_trait]
pub trait IdentitySynchronization: Send + Sync {
    /// Reconciles local state with the external provider.
    ///
    /// Backends that need no reconciliation return `Ok(true)` without side
    /// effects.
    async fn synchronize_users(&self) -> IdentityResult<bool>;
}

/// The unified identity-manager contract: the union of all capability
/// traits.
///
/// This is the sole interface the application layer depends on; callers
/// never interact with a concrete backend directly.
pub trait IdentityManager:
    UserManagement
    + RoleManagement
    + UserRoleManagement
    + GroupManagement
    + UserGroupManagement
    + GroupRoleManagement
    + IdentitySynchronization
{
}

impl<T> IdentityManager for T where
    T: UserManagement
        + RoleManagement
        + UserRoleManagement
        + GroupManagement
        + UserGroupManagement
        + GroupRoleManagement
        + IdentitySynchronization
{
}
