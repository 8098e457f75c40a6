//! Keycloak-backed identity manager.
//!
//! Delegates every operation to the admin REST API. Role and group
//! mutation and all group-role operations are not available through the
//! admin API in this deployment and fail with an explicit
//! unsupported-operation error; wrap the manager in
//! [`SafeKeycloakManager`](crate::SafeKeycloakManager) to get harmless
//! defaults instead.

use std::sync::Arc;

use async_trait::async_trait;

use bms_identity::{
    CredentialRepresentation, GroupManagement, GroupRepresentation, GroupRoleManagement,
    IdentityError, IdentityResult, IdentitySynchronization, RoleManagement,
    RoleRepresentation, UserGroupManagement, UserManagement, UserRepresentation,
    UserRoleManagement,
};

use crate::client::KeycloakAdminClient;
use crate::models::{KeycloakCredential, KeycloakRole, KeycloakUser};

/// Identity manager that uses Keycloak as the primary identity provider.
pub struct KeycloakIdentityManager {
    client: Arc<KeycloakAdminClient>,
}

impl KeycloakIdentityManager {
    /// Creates a manager over the given admin client.
    #[must_use]
    pub fn new(client: Arc<KeycloakAdminClient>) -> Self {
        Self { client }
    }

    /// Resolves the wire roles matching the given ids or names.
    ///
    /// Role references arrive as ids from the admin UI but historical call
    /// sites passed names; both are accepted. Unknown references are
    /// skipped.
    async fn resolve_roles(&self, refs: &[String]) -> IdentityResult<Vec<KeycloakRole>> {
        let all = self.client.roles().await?;
        Ok(all
            .into_iter()
            .filter(|r| {
                refs.iter().any(|wanted| {
                    r.id.as_deref() == Some(wanted) || r.name.as_deref() == Some(wanted)
                })
            })
            .collect())
    }

    fn find_group_by_path(
        groups: Vec<GroupRepresentation>,
        path: &str,
    ) -> Option<GroupRepresentation> {
        for group in groups {
            if group.path == path {
                return Some(group);
            }
            if let Some(found) = Self::find_group_by_path(group.sub_groups, path) {
                return Some(found);
            }
        }
        None
    }
}

#[async_trait]
impl UserManagement for KeycloakIdentityManager {
    fn supports_user_creation(&self) -> bool {
        true
    }

    async fn users(&self) -> IdentityResult<Vec<UserRepresentation>> {
        let users = self.client.users().await?;
        Ok(users
            .into_iter()
            .map(KeycloakUser::into_representation)
            .collect())
    }

    async fn user_by_id(&self, user_id: &str) -> IdentityResult<Option<UserRepresentation>> {
        let user = self.client.user_by_id(user_id).await?;
        Ok(user.map(KeycloakUser::into_representation))
    }

    async fn user_by_username(
        &self,
        username: &str,
    ) -> IdentityResult<Option<UserRepresentation>> {
        let users = self.client.users_by_username(username).await?;
        Ok(users
            .into_iter()
            .find(|u| u.username.as_deref() == Some(username))
            .map(KeycloakUser::into_representation))
    }

    async fn create_user(
        &self,
        user: &UserRepresentation,
        password: &str,
    ) -> IdentityResult<bool> {
        let wire = KeycloakUser::from_representation(user, Some(password));
        self.client.create_user(&wire).await?;
        Ok(true)
    }

    async fn update_user(
        &self,
        user_id: &str,
        user: &UserRepresentation,
    ) -> IdentityResult<bool> {
        let wire = KeycloakUser::from_representation(user, None);
        self.client.update_user(user_id, &wire).await?;
        Ok(true)
    }

    async fn delete_user(&self, user_id: &str) -> IdentityResult<bool> {
        self.client.delete_user(user_id).await?;
        Ok(true)
    }

    async fn reset_password(
        &self,
        user_id: &str,
        credential: &CredentialRepresentation,
    ) -> IdentityResult<bool> {
        let wire = KeycloakCredential {
            kind: credential.kind.clone(),
            value: credential.value.clone(),
            temporary: credential.temporary,
        };
        self.client.reset_password(user_id, &wire).await?;
        Ok(true)
    }
}

#[async_trait]
impl RoleManagement for KeycloakIdentityManager {
    fn supports_direct_role_creation(&self) -> bool {
        false
    }

    async fn roles(&self) -> IdentityResult<Vec<RoleRepresentation>> {
        let roles = self.client.roles().await?;
        Ok(roles
            .into_iter()
            .map(KeycloakRole::into_representation)
            .collect())
    }

    async fn role_by_id(&self, role_id: &str) -> IdentityResult<Option<RoleRepresentation>> {
        // The admin API looks roles up by name; by-id goes through the list.
        let roles = self.roles().await?;
        Ok(roles.into_iter().find(|r| r.id == role_id))
    }

    async fn role_by_name(&self, name: &str) -> IdentityResult<Option<RoleRepresentation>> {
        let role = self.client.role_by_name(name).await?;
        Ok(role.map(KeycloakRole::into_representation))
    }

    async fn create_role(
        &self,
        _role: &RoleRepresentation,
    ) -> IdentityResult<RoleRepresentation> {
        Err(IdentityError::unsupported("create_role"))
    }

    async fn update_role(
        &self,
        _role_id: &str,
        _role: &RoleRepresentation,
    ) -> IdentityResult<bool> {
        Err(IdentityError::unsupported("update_role"))
    }

    async fn delete_role(&self, _role_id: &str) -> IdentityResult<bool> {
        Err(IdentityError::unsupported("delete_role"))
    }
}

#[async_trait]
impl UserRoleManagement for KeycloakIdentityManager {
    async fn assign_roles_to_user(
        &self,
        user_id: &str,
        role_ids: &[String],
    ) -> IdentityResult<bool> {
        let roles = self.resolve_roles(role_ids).await?;
        if !roles.is_empty() {
            self.client.add_user_realm_roles(user_id, &roles).await?;
        }
        Ok(true)
    }

    async fn remove_roles_from_user(
        &self,
        user_id: &str,
        role_ids: &[String],
    ) -> IdentityResult<bool> {
        let current = self.client.user_realm_roles(user_id).await?;
        let to_remove: Vec<KeycloakRole> = current
            .into_iter()
            .filter(|r| {
                role_ids.iter().any(|wanted| {
                    r.id.as_deref() == Some(wanted) || r.name.as_deref() == Some(wanted)
                })
            })
            .collect();
        if !to_remove.is_empty() {
            self.client
                .remove_user_realm_roles(user_id, &to_remove)
                .await?;
        }
        Ok(true)
    }

    async fn user_roles(&self, user_id: &str) -> IdentityResult<Vec<RoleRepresentation>> {
        let roles = self.client.user_realm_roles(user_id).await?;
        Ok(roles
            .into_iter()
            .map(KeycloakRole::into_representation)
            .collect())
    }

    /// Fetches the full user list and probes each user's role mappings
    /// individually. O(n) in the user count with no pagination; acceptable
    /// only at small scale.
    async fn users_in_role(&self, role_id: &str) -> IdentityResult<Vec<UserRepresentation>> {
        let users = self.users().await?;
        let mut holders = Vec::new();

        for user in users {
            if user.id.is_empty() {
                continue;
            }
            let roles = self.client.user_realm_roles(&user.id).await?;
            if roles.iter().any(|r| r.id.as_deref() == Some(role_id)) {
                holders.push(user);
            }
        }

        Ok(holders)
    }
}

#[async_trait]
impl GroupManagement for KeycloakIdentityManager {
    fn supports_direct_group_creation(&self) -> bool {
        false
    }

    async fn groups(&self) -> IdentityResult<Vec<GroupRepresentation>> {
        let groups = self.client.groups().await?;
        Ok(groups
            .into_iter()
            .map(crate::models::KeycloakGroup::into_representation)
            .collect())
    }

    async fn group_by_id(
        &self,
        group_id: &str,
    ) -> IdentityResult<Option<GroupRepresentation>> {
        let group = self.client.group_by_id(group_id).await?;
        Ok(group.map(crate::models::KeycloakGroup::into_representation))
    }

    async fn group_by_path(&self, path: &str) -> IdentityResult<Option<GroupRepresentation>> {
        let groups = self.groups().await?;
        Ok(Self::find_group_by_path(groups, path))
    }

    async fn create_group(
        &self,
        _group: &GroupRepresentation,
    ) -> IdentityResult<GroupRepresentation> {
        Err(IdentityError::unsupported("create_group"))
    }

    async fn update_group(
        &self,
        _group_id: &str,
        _group: &GroupRepresentation,
    ) -> IdentityResult<bool> {
        Err(IdentityError::unsupported("update_group"))
    }

    async fn delete_group(&self, _group_id: &str) -> IdentityResult<bool> {
        Err(IdentityError::unsupported("delete_group"))
    }
}

#[async_trait]
impl UserGroupManagement for KeycloakIdentityManager {
    async fn assign_user_to_groups(
        &self,
        user_id: &str,
        group_ids: &[String],
    ) -> IdentityResult<bool> {
        for group_id in group_ids {
            self.client.add_user_to_group(user_id, group_id).await?;
        }
        Ok(true)
    }

    async fn remove_user_from_groups(
        &self,
        user_id: &str,
        group_ids: &[String],
    ) -> IdentityResult<bool> {
        for group_id in group_ids {
            self.client
                .remove_user_from_group(user_id, group_id)
                .await?;
        }
        Ok(true)
    }

    async fn user_groups(&self, user_id: &str) -> IdentityResult<Vec<String>> {
        let groups = self.client.user_groups(user_id).await?;
        Ok(groups.into_iter().filter_map(|g| g.id).collect())
    }

    /// Fetches the full user list and probes each user's group memberships
    /// individually. O(n) in the user count with no pagination; acceptable
    /// only at small scale.
    async fn users_in_group(
        &self,
        group_id: &str,
    ) -> IdentityResult<Vec<UserRepresentation>> {
        let users = self.users().await?;
        let mut members = Vec::new();

        for user in users {
            if user.id.is_empty() {
                continue;
            }
            let groups = self.client.user_groups(&user.id).await?;
            if groups.iter().any(|g| g.id.as_deref() == Some(group_id)) {
                members.push(user);
            }
        }

        Ok(members)
    }
}

#[async_trait]
impl GroupRoleManagement for KeycloakIdentityManager {
    async fn group_roles(&self, _group_id: &str) -> IdentityResult<Vec<RoleRepresentation>> {
        Err(IdentityError::unsupported("group_roles"))
    }

    async fn assign_roles_to_group(
        &self,
        _group_id: &str,
        _role_ids: &[String],
    ) -> IdentityResult<bool> {
        Err(IdentityError::unsupported("assign_roles_to_group"))
    }

    async fn remove_roles_from_group(
        &self,
        _group_id: &str,
        _role_ids: &[String],
    ) -> IdentityResult<bool> {
        Err(IdentityError::unsupported("remove_roles_from_group"))
    }
}

#[async_trait]
impl IdentitySynchronization for KeycloakIdentityManager {
    async fn synchronize_users(&self) -> IdentityResult<bool> {
        // Keycloak is the source of truth in direct mode; nothing to
        // reconcile.
        Ok(true)
    }
}
