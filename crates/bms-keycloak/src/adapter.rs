//! Error-absorbing adapter over the Keycloak manager.
//!
//! Application code is written against the unified contract and should not
//! need mode-specific exception handling. This adapter passes supported
//! operations through unchanged and turns the Keycloak manager's
//! unsupported operations into harmless defaults: empty collections,
//! `false`, or a placeholder result carrying the attempted name but an
//! empty identifier.

use std::sync::Arc;

use async_trait::async_trait;

use bms_identity::{
    CredentialRepresentation, GroupManagement, GroupRepresentation, GroupRoleManagement,
    IdentityResult, IdentitySynchronization, RoleManagement, RoleRepresentation,
    UserGroupManagement, UserManagement, UserRepresentation, UserRoleManagement,
};

use crate::manager::KeycloakIdentityManager;

/// Safe facade over [`KeycloakIdentityManager`].
pub struct SafeKeycloakManager {
    inner: Arc<KeycloakIdentityManager>,
}

impl SafeKeycloakManager {
    /// Wraps a Keycloak manager.
    #[must_use]
    pub fn new(inner: Arc<KeycloakIdentityManager>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl UserManagement for SafeKeycloakManager {
    fn supports_user_creation(&self) -> bool {
        self.inner.supports_user_creation()
    }

    async fn users(&self) -> IdentityResult<Vec<UserRepresentation>> {
        self.inner.users().await
    }

    async fn user_by_id(&self, user_id: &str) -> IdentityResult<Option<UserRepresentation>> {
        self.inner.user_by_id(user_id).await
    }

    async fn user_by_username(
        &self,
        username: &str,
    ) -> IdentityResult<Option<UserRepresentation>> {
        self.inner.user_by_username(username).await
    }

    async fn create_user(
        &self,
        user: &UserRepresentation,
        password: &str,
    ) -> IdentityResult<bool> {
        self.inner.create_user(user, password).await
    }

    async fn update_user(
        &self,
        user_id: &str,
        user: &UserRepresentation,
    ) -> IdentityResult<bool> {
        self.inner.update_user(user_id, user).await
    }

    async fn delete_user(&self, user_id: &str) -> IdentityResult<bool> {
        self.inner.delete_user(user_id).await
    }

    async fn reset_password(
        &self,
        user_id: &str,
        credential: &CredentialRepresentation,
    ) -> IdentityResult<bool> {
        self.inner.reset_password(user_id, credential).await
    }
}

#[async_trait]
impl RoleManagement for SafeKeycloakManager {
    fn supports_direct_role_creation(&self) -> bool {
        self.inner.supports_direct_role_creation()
    }

    async fn roles(&self) -> IdentityResult<Vec<RoleRepresentation>> {
        self.inner.roles().await
    }

    async fn role_by_id(&self, role_id: &str) -> IdentityResult<Option<RoleRepresentation>> {
        self.inner.role_by_id(role_id).await
    }

    async fn role_by_name(&self, name: &str) -> IdentityResult<Option<RoleRepresentation>> {
        self.inner.role_by_name(name).await
    }

    async fn create_role(
        &self,
        role: &RoleRepresentation,
    ) -> IdentityResult<RoleRepresentation> {
        // Placeholder: requested name, empty identifier, never an error.
        Ok(RoleRepresentation {
            id: String::new(),
            name: role.name.clone(),
            description: "Not created - operation not supported".to_string(),
        })
    }

    async fn update_role(
        &self,
        _role_id: &str,
        _role: &RoleRepresentation,
    ) -> IdentityResult<bool> {
        Ok(false)
    }

    async fn delete_role(&self, _role_id: &str) -> IdentityResult<bool> {
        Ok(false)
    }
}

#[async_trait]
impl UserRoleManagement for SafeKeycloakManager {
    async fn assign_roles_to_user(
        &self,
        user_id: &str,
        role_ids: &[String],
    ) -> IdentityResult<bool> {
        self.inner.assign_roles_to_user(user_id, role_ids).await
    }

    async fn remove_roles_from_user(
        &self,
        user_id: &str,
        role_ids: &[String],
    ) -> IdentityResult<bool> {
        self.inner.remove_roles_from_user(user_id, role_ids).await
    }

    async fn user_roles(&self, user_id: &str) -> IdentityResult<Vec<RoleRepresentation>> {
        self.inner.user_roles(user_id).await
    }

    async fn users_in_role(&self, role_id: &str) -> IdentityResult<Vec<UserRepresentation>> {
        self.inner.users_in_role(role_id).await
    }
}

#[async_trait]
impl GroupManagement for SafeKeycloakManager {
    fn supports_direct_group_creation(&self) -> bool {
        self.inner.supports_direct_group_creation()
    }

    async fn groups(&self) -> IdentityResult<Vec<GroupRepresentation>> {
        self.inner.groups().await
    }

    async fn group_by_id(
        &self,
        group_id: &str,
    ) -> IdentityResult<Option<GroupRepresentation>> {
        self.inner.group_by_id(group_id).await
    }

    async fn group_by_path(&self, path: &str) -> IdentityResult<Option<GroupRepresentation>> {
        self.inner.group_by_path(path).await
    }

    async fn create_group(
        &self,
        group: &GroupRepresentation,
    ) -> IdentityResult<GroupRepresentation> {
        // Placeholder: requested name and path, empty identifier.
        Ok(GroupRepresentation {
            id: String::new(),
            name: group.name.clone(),
            path: group.path.clone(),
            parent_id: String::new(),
            sub_groups: Vec::new(),
        })
    }

    async fn update_group(
        &self,
        _group_id: &str,
        _group: &GroupRepresentation,
    ) -> IdentityResult<bool> {
        Ok(false)
    }

    async fn delete_group(&self, _group_id: &str) -> IdentityResult<bool> {
        Ok(false)
    }
}

#[async_trait]
impl UserGroupManagement for SafeKeycloakManager {
    async fn assign_user_to_groups(
        &self,
        user_id: &str,
        group_ids: &[String],
    ) -> IdentityResult<bool> {
        self.inner.assign_user_to_groups(user_id, group_ids).await
    }

    async fn remove_user_from_groups(
        &self,
        user_id: &str,
        group_ids: &[String],
    ) -> IdentityResult<bool> {
        self.inner
            .remove_user_from_groups(user_id, group_ids)
            .await
    }

    async fn user_groups(&self, user_id: &str) -> IdentityResult<Vec<String>> {
        self.inner.user_groups(user_id).await
    }

    async fn users_in_group(
        &self,
        group_id: &str,
    ) -> IdentityResult<Vec<UserRepresentation>> {
        self.inner.users_in_group(group_id).await
    }
}

#[async_trait]
impl GroupRoleManagement for SafeKeycloakManager {
    async fn group_roles(&self, _group_id: &str) -> IdentityResult<Vec<RoleRepresentation>> {
        Ok(Vec::new())
    }

    async fn assign_roles_to_group(
        &self,
        _group_id: &str,
        _role_ids: &[String],
    ) -> IdentityResult<bool> {
        Ok(false)
    }

    async fn remove_roles_from_group(
        &self,
        _group_id: &str,
        _role_ids: &[String],
    ) -> IdentityResult<bool> {
        Ok(false)
    }
}

#[async_trait]
impl IdentitySynchronization for SafeKeycloakManager {
    async fn synchronize_users(&self) -> IdentityResult<bool> {
        self.inner.synchronize_users().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::KeycloakAdminClient;
    use crate::config::KeycloakConfig;

    fn adapter() -> SafeKeycloakManager {
        let client = KeycloakAdminClient::new(KeycloakConfig::default()).unwrap();
        SafeKeycloakManager::new(Arc::new(KeycloakIdentityManager::new(Arc::new(client))))
    }

    #[tokio::test]
    async fn create_group_returns_placeholder_instead_of_error() {
        let adapter = adapter();
        let requested = GroupRepresentation {
            name: "team".into(),
            path: "/org/team".into(),
            ..GroupRepresentation::default()
        };

        let created = adapter.create_group(&requested).await.unwrap();
        assert_eq!(created.name, "team");
        assert_eq!(created.path, "/org/team");
        assert!(created.id.is_empty());
    }

    #[tokio::test]
    async fn create_role_returns_placeholder_with_requested_name() {
        let adapter = adapter();
        let created = adapter
            .create_role(&RoleRepresentation::named("Editor"))
            .await
            .unwrap();

        assert_eq!(created.name, "Editor");
        assert!(created.id.is_empty());
    }

    #[tokio::test]
    async fn unsupported_mutations_degrade_to_false_or_empty() {
        let adapter = adapter();

        assert!(!adapter.update_role("r", &RoleRepresentation::default()).await.unwrap());
        assert!(!adapter.delete_role("r").await.unwrap());
        assert!(!adapter.update_group("g", &GroupRepresentation::default()).await.unwrap());
        assert!(!adapter.delete_group("g").await.unwrap());
        assert!(adapter.group_roles("g").await.unwrap().is_empty());
        assert!(!adapter.assign_roles_to_group("g", &[]).await.unwrap());
        assert!(!adapter.remove_roles_from_group("g", &[]).await.unwrap());
    }

    #[test]
    fn capability_flags_delegate() {
        let adapter = adapter();
        assert!(adapter.supports_user_creation());
        assert!(!adapter.supports_direct_role_creation());
        assert!(!adapter.supports_direct_group_creation());
    }
}
