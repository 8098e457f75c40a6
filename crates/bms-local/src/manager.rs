//! Local/proxy-backed identity manager.
//!
//! Implements the full identity-manager contract against local storage.
//! Users, roles, groups and their associations are authoritative here when
//! the application runs in proxy mode; the external provider only
//! authenticates.
//!
//! Identifier handling: contract ids are strings; anything that doesn't
//! parse as a UUID is treated as not found (`None`/`false`/empty), never as
//! an error.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use bms_identity::{
    CredentialRepresentation, GroupManagement, GroupRepresentation, GroupRoleManagement,
    GroupStore, IdentityResult, IdentitySynchronization, RoleManagement, RoleRepresentation,
    RoleStore, UserGroupManagement, UserManagement, UserRepresentation, UserRoleManagement,
    UserStore,
};
use bms_model::{group::child_path, Group, Role, User};

/// Identity manager backed entirely by local storage.
pub struct LocalIdentityManager {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    groups: Arc<dyn GroupStore>,
}

impl LocalIdentityManager {
    /// Creates a manager over the given stores.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        groups: Arc<dyn GroupStore>,
    ) -> Self {
        Self {
            users,
            roles,
            groups,
        }
    }

    fn parse_id(id: &str) -> Option<Uuid> {
        Uuid::parse_str(id).ok()
    }

    /// Builds the hierarchical representation for the given parent from a
    /// flat group list.
    fn build_hierarchy(flat: &[Group], parent_id: Option<Uuid>) -> Vec<GroupRepresentation> {
        flat.iter()
            .filter(|g| g.parent_id == parent_id)
            .map(|g| {
                let mut repr = GroupRepresentation::from(g.clone());
                repr.sub_groups = Self::build_hierarchy(flat, Some(g.id));
                repr
            })
            .collect()
    }

    async fn users_by_ids(&self, ids: Vec<String>) -> IdentityResult<Vec<UserRepresentation>> {
        let mut users = Vec::new();
        for id in ids {
            if let Some(user) = self.users.by_id(&id).await? {
                users.push(UserRepresentation::from(user));
            }
        }
        Ok(users)
    }
}

#[async_trait]
impl UserManagement for LocalIdentityManager {
    fn supports_user_creation(&self) -> bool {
        true
    }

    async fn users(&self) -> IdentityResult<Vec<UserRepresentation>> {
        let users = self.users.all().await?;
        Ok(users.into_iter().map(UserRepresentation::from).collect())
    }

    async fn user_by_id(&self, user_id: &str) -> IdentityResult<Option<UserRepresentation>> {
        Ok(self
            .users
            .by_id(user_id)
            .await?
            .map(UserRepresentation::from))
    }

    async fn user_by_username(
        &self,
        username: &str,
    ) -> IdentityResult<Option<UserRepresentation>> {
        Ok(self
            .users
            .by_username(username)
            .await?
            .map(UserRepresentation::from))
    }

    async fn create_user(
        &self,
        user: &UserRepresentation,
        _password: &str,
    ) -> IdentityResult<bool> {
        // Credentials stay with the authentication provider; the local
        // record only carries the profile.
        let id = if user.id.is_empty() {
            Uuid::now_v7().to_string()
        } else {
            user.id.clone()
        };

        let mut record = User::new(id, user.username.clone())
            .with_email(user.email.clone())
            .with_name(user.first_name.clone(), user.last_name.clone())
            .with_organization(user.organization.clone());
        record.enabled = user.enabled;

        self.users.create(&record).await?;
        Ok(true)
    }

    async fn update_user(
        &self,
        user_id: &str,
        user: &UserRepresentation,
    ) -> IdentityResult<bool> {
        let Some(mut existing) = self.users.by_id(user_id).await? else {
            return Ok(false);
        };

        // Blank update fields fall back to the existing values.
        if !user.username.is_empty() {
            existing.username = user.username.clone();
        }
        if !user.email.is_empty() {
            existing.email = user.email.clone();
        }
        if !user.first_name.is_empty() {
            existing.first_name = user.first_name.clone();
        }
        if !user.last_name.is_empty() {
            existing.last_name = user.last_name.clone();
        }
        if !user.organization.is_empty() {
            existing.organization = user.organization.clone();
        }
        existing.enabled = user.enabled;
        existing.updated_at = Some(Utc::now());

        self.users.update(&existing).await?;
        Ok(true)
    }

    async fn delete_user(&self, user_id: &str) -> IdentityResult<bool> {
        Ok(self.users.delete(user_id).await?)
    }

    async fn reset_password(
        &self,
        user_id: &str,
        _credential: &CredentialRepresentation,
    ) -> IdentityResult<bool> {
        // Passwords live with the authentication provider, not locally;
        // succeed only for known users so the UI can report a sane result.
        Ok(self.users.by_id(user_id).await?.is_some())
    }
}

#[async_trait]
impl RoleManagement for LocalIdentityManager {
    fn supports_direct_role_creation(&self) -> bool {
        true
    }

    async fn roles(&self) -> IdentityResult<Vec<RoleRepresentation>> {
        let roles = self.roles.all().await?;
        Ok(roles.into_iter().map(RoleRepresentation::from).collect())
    }

    async fn role_by_id(&self, role_id: &str) -> IdentityResult<Option<RoleRepresentation>> {
        let Some(id) = Self::parse_id(role_id) else {
            return Ok(None);
        };
        Ok(self.roles.by_id(id).await?.map(RoleRepresentation::from))
    }

    async fn role_by_name(&self, name: &str) -> IdentityResult<Option<RoleRepresentation>> {
        Ok(self.roles.by_name(name).await?.map(RoleRepresentation::from))
    }

    async fn create_role(
        &self,
        role: &RoleRepresentation,
    ) -> IdentityResult<RoleRepresentation> {
        let record = Role::new(role.name.clone()).with_description(role.description.clone());
        self.roles.create(&record).await?;
        Ok(RoleRepresentation::from(record))
    }

    async fn update_role(
        &self,
        role_id: &str,
        role: &RoleRepresentation,
    ) -> IdentityResult<bool> {
        let Some(id) = Self::parse_id(role_id) else {
            return Ok(false);
        };
        let Some(mut existing) = self.roles.by_id(id).await? else {
            return Ok(false);
        };

        if !role.name.is_empty() {
            existing.name = role.name.clone();
        }
        if !role.description.is_empty() {
            existing.description = role.description.clone();
        }
        existing.updated_at = Some(Utc::now());

        self.roles.update(&existing).await?;
        Ok(true)
    }

    async fn delete_role(&self, role_id: &str) -> IdentityResult<bool> {
        let Some(id) = Self::parse_id(role_id) else {
            return Ok(false);
        };
        self.roles.delete(id).await?;
        Ok(true)
    }
}

#[async_trait]
impl UserRoleManagement for LocalIdentityManager {
    async fn assign_roles_to_user(
        &self,
        user_id: &str,
        role_ids: &[String],
    ) -> IdentityResult<bool> {
        for role_id in role_ids {
            let Some(id) = Self::parse_id(role_id) else {
                continue;
            };
            self.roles.add_user(user_id, id).await?;
        }
        Ok(true)
    }

    async fn remove_roles_from_user(
        &self,
        user_id: &str,
        role_ids: &[String],
    ) -> IdentityResult<bool> {
        for role_id in role_ids {
            let Some(id) = Self::parse_id(role_id) else {
                continue;
            };
            self.roles.remove_user(user_id, id).await?;
        }
        Ok(true)
    }

    async fn user_roles(&self, user_id: &str) -> IdentityResult<Vec<RoleRepresentation>> {
        let roles = self.roles.by_user(user_id).await?;
        Ok(roles.into_iter().map(RoleRepresentation::from).collect())
    }

    /// Resolves membership through the association table, O(k) in the
    /// number of members.
    async fn users_in_role(&self, role_id: &str) -> IdentityResult<Vec<UserRepresentation>> {
        let Some(id) = Self::parse_id(role_id) else {
            return Ok(Vec::new());
        };
        let ids = self.roles.user_ids_in_role(id).await?;
        self.users_by_ids(ids).await
    }
}

#[async_trait]
impl GroupManagement for LocalIdentityManager {
    fn supports_direct_group_creation(&self) -> bool {
        true
    }

    async fn groups(&self) -> IdentityResult<Vec<GroupRepresentation>> {
        let flat = self.groups.all().await?;
        Ok(Self::build_hierarchy(&flat, None))
    }

    async fn group_by_id(
        &self,
        group_id: &str,
    ) -> IdentityResult<Option<GroupRepresentation>> {
        let Some(id) = Self::parse_id(group_id) else {
            return Ok(None);
        };
        Ok(self.groups.by_id(id).await?.map(GroupRepresentation::from))
    }

    async fn group_by_path(&self, path: &str) -> IdentityResult<Option<GroupRepresentation>> {
        Ok(self
            .groups
            .by_path(path)
            .await?
            .map(GroupRepresentation::from))
    }

    async fn create_group(
        &self,
        group: &GroupRepresentation,
    ) -> IdentityResult<GroupRepresentation> {
        // Resolve the parent to derive the path; an unresolvable parent id
        // degrades to a top-level group with the dangling reference
        // dropped. A colliding path is rejected by the store's unique
        // constraint.
        let parent = match Self::parse_id(&group.parent_id) {
            Some(parent_id) => self.groups.by_id(parent_id).await?,
            None => None,
        };

        let record = match parent {
            Some(parent) => {
                let mut child = Group::new(group.name.clone());
                child.path = child_path(&parent.path, &group.name);
                child.parent_id = Some(parent.id);
                child
            }
            None => Group::new(group.name.clone()),
        };

        self.groups.create(&record).await?;
        Ok(GroupRepresentation::from(record))
    }

    async fn update_group(
        &self,
        group_id: &str,
        group: &GroupRepresentation,
    ) -> IdentityResult<bool> {
        let Some(id) = Self::parse_id(group_id) else {
            return Ok(false);
        };
        let Some(mut existing) = self.groups.by_id(id).await? else {
            return Ok(false);
        };

        if !group.name.is_empty() && group.name != existing.name {
            let parent_path = match existing.parent_id {
                Some(parent_id) => self
                    .groups
                    .by_id(parent_id)
                    .await?
                    .map_or_else(|| "/".to_string(), |p| p.path),
                None => "/".to_string(),
            };
            existing.path = child_path(&parent_path, &group.name);
            existing.name = group.name.clone();
            // TODO: recompute descendant paths on rename; today children
            // keep their old path prefix.
        }
        existing.updated_at = Some(Utc::now());

        self.groups.update(&existing).await?;
        Ok(true)
    }

    async fn delete_group(&self, group_id: &str) -> IdentityResult<bool> {
        let Some(id) = Self::parse_id(group_id) else {
            return Ok(false);
        };
        self.groups.delete(id).await?;
        Ok(true)
    }
}

#[async_trait]
impl UserGroupManagement for LocalIdentityManager {
    async fn assign_user_to_groups(
        &self,
        user_id: &str,
        group_ids: &[String],
    ) -> IdentityResult<bool> {
        for group_id in group_ids {
            let Some(id) = Self::parse_id(group_id) else {
                continue;
            };
            self.groups.add_user(user_id, id).await?;
        }
        Ok(true)
    }

    async fn remove_user_from_groups(
        &self,
        user_id: &str,
        group_ids: &[String],
    ) -> IdentityResult<bool> {
        for group_id in group_ids {
            let Some(id) = Self::parse_id(group_id) else {
                continue;
            };
            self.groups.remove_user(user_id, id).await?;
        }
        Ok(true)
    }

    async fn user_groups(&self, user_id: &str) -> IdentityResult<Vec<String>> {
        let groups = self.groups.by_user(user_id).await?;
        Ok(groups.into_iter().map(|g| g.id.to_string()).collect())
    }

    /// Resolves membership through the association table, O(k) in the
    /// number of members.
    async fn users_in_group(
        &self,
        group_id: &str,
    ) -> IdentityResult<Vec<UserRepresentation>> {
        let Some(id) = Self::parse_id(group_id) else {
            return Ok(Vec::new());
        };
        let ids = self.groups.user_ids_in_group(id).await?;
        self.users_by_ids(ids).await
    }
}

#[async_trait]
impl GroupRoleManagement for LocalIdentityManager {
    /// Group-role inheritance is keyed by path: the group's current path is
    /// resolved first and roles are looked up through it.
    async fn group_roles(&self, group_id: &str) -> IdentityResult<Vec<RoleRepresentation>> {
        let Some(id) = Self::parse_id(group_id) else {
            return Ok(Vec::new());
        };
        let Some(group) = self.groups.by_id(id).await? else {
            return Ok(Vec::new());
        };

        let roles = self.roles.by_group_path(&group.path).await?;
        Ok(roles.into_iter().map(RoleRepresentation::from).collect())
    }

    async fn assign_roles_to_group(
        &self,
        group_id: &str,
        role_ids: &[String],
    ) -> IdentityResult<bool> {
        let Some(group) = Self::parse_id(group_id) else {
            return Ok(false);
        };
        for role_id in role_ids {
            let Some(role) = Self::parse_id(role_id) else {
                continue;
            };
            self.roles.assign_group(group, role).await?;
        }
        Ok(true)
    }

    async fn remove_roles_from_group(
        &self,
        group_id: &str,
        role_ids: &[String],
    ) -> IdentityResult<bool> {
        let Some(group) = Self::parse_id(group_id) else {
            return Ok(false);
        };
        for role_id in role_ids {
            let Some(role) = Self::parse_id(role_id) else {
                continue;
            };
            self.roles.remove_group(group, role).await?;
        }
        Ok(true)
    }
}

#[async_trait]
impl IdentitySynchronization for LocalIdentityManager {
    async fn synchronize_users(&self) -> IdentityResult<bool> {
        // Local mode needs no external reconciliation.
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use bms_identity::IdentityError;

    fn manager() -> (LocalIdentityManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let manager = LocalIdentityManager::new(
            Arc::clone(&store) as Arc<dyn UserStore>,
            Arc::clone(&store) as Arc<dyn RoleStore>,
            Arc::clone(&store) as Arc<dyn GroupStore>,
        );
        (manager, store)
    }

    #[test]
    fn capability_flags_are_all_true() {
        let (manager, _) = manager();
        assert!(manager.supports_user_creation());
        assert!(manager.supports_direct_role_creation());
        assert!(manager.supports_direct_group_creation());
    }

    #[tokio::test]
    async fn role_round_trip_by_id_and_name() {
        let (manager, _) = manager();
        let created = manager
            .create_role(&RoleRepresentation {
                name: "Editor".into(),
                description: "Approves posts".into(),
                ..RoleRepresentation::default()
            })
            .await
            .unwrap();
        assert!(!created.id.is_empty());

        let by_id = manager.role_by_id(&created.id).await.unwrap().unwrap();
        let by_name = manager.role_by_name("Editor").await.unwrap().unwrap();
        assert_eq!(by_id.id, by_name.id);
        assert_eq!(by_id.description, "Approves posts");
    }

    #[tokio::test]
    async fn malformed_ids_are_not_found() {
        let (manager, _) = manager();

        assert!(manager.role_by_id("not-a-uuid").await.unwrap().is_none());
        assert!(manager.group_by_id("not-a-uuid").await.unwrap().is_none());
        assert!(!manager.delete_role("not-a-uuid").await.unwrap());
        assert!(!manager.delete_group("not-a-uuid").await.unwrap());
        assert!(manager.users_in_role("not-a-uuid").await.unwrap().is_empty());
        assert!(manager.group_roles("not-a-uuid").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn group_paths_compose_from_parents() {
        let (manager, _) = manager();
        let root = manager
            .create_group(&GroupRepresentation::named("org"))
            .await
            .unwrap();
        assert_eq!(root.path, "/org");

        let child = manager
            .create_group(&GroupRepresentation::named("team").with_parent(root.id.clone()))
            .await
            .unwrap();
        assert_eq!(child.path, "/org/team");
        assert_eq!(child.parent_id, root.id);

        let fetched = manager.group_by_path("/org/team").await.unwrap().unwrap();
        assert_eq!(fetched.id, child.id);
    }

    #[tokio::test]
    async fn unresolvable_parent_creates_pseudo_root() {
        let (manager, _) = manager();
        let group = manager
            .create_group(
                &GroupRepresentation::named("orphan")
                    .with_parent(Uuid::now_v7().to_string()),
            )
            .await
            .unwrap();

        assert_eq!(group.path, "/orphan");
        assert!(group.parent_id.is_empty());
    }

    #[tokio::test]
    async fn duplicate_path_is_rejected() {
        let (manager, _) = manager();
        manager
            .create_group(&GroupRepresentation::named("org"))
            .await
            .unwrap();

        let err = manager
            .create_group(&GroupRepresentation::named("org"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Store(e) if e.is_duplicate()));
    }

    #[tokio::test]
    async fn cascade_delete_spares_siblings() {
        let (manager, _) = manager();
        let root = manager
            .create_group(&GroupRepresentation::named("org"))
            .await
            .unwrap();
        let team = manager
            .create_group(&GroupRepresentation::named("team").with_parent(root.id.clone()))
            .await
            .unwrap();
        let deep = manager
            .create_group(&GroupRepresentation::named("deep").with_parent(team.id.clone()))
            .await
            .unwrap();
        let sibling = manager
            .create_group(&GroupRepresentation::named("other"))
            .await
            .unwrap();

        manager
            .assign_user_to_groups("u1", &[deep.id.clone(), sibling.id.clone()])
            .await
            .unwrap();

        assert!(manager.delete_group(&root.id).await.unwrap());

        for id in [&root.id, &team.id, &deep.id] {
            assert!(manager.group_by_id(id).await.unwrap().is_none());
        }
        assert!(manager.group_by_id(&sibling.id).await.unwrap().is_some());
        // Only the sibling membership survives.
        assert_eq!(manager.user_groups("u1").await.unwrap(), vec![sibling.id]);
    }

    #[tokio::test]
    async fn group_listing_is_hierarchical() {
        let (manager, _) = manager();
        let root = manager
            .create_group(&GroupRepresentation::named("org"))
            .await
            .unwrap();
        manager
            .create_group(&GroupRepresentation::named("team").with_parent(root.id.clone()))
            .await
            .unwrap();
        manager
            .create_group(&GroupRepresentation::named("other"))
            .await
            .unwrap();

        let tree = manager.groups().await.unwrap();
        assert_eq!(tree.len(), 2);

        let org = tree.iter().find(|g| g.name == "org").unwrap();
        assert_eq!(org.sub_groups.len(), 1);
        assert_eq!(org.sub_groups[0].path, "/org/team");
    }

    #[tokio::test]
    async fn assigning_same_role_twice_keeps_one_edge() {
        let (manager, _) = manager();
        let role = manager
            .create_role(&RoleRepresentation::named("Author"))
            .await
            .unwrap();

        manager
            .assign_roles_to_user("u1", &[role.id.clone()])
            .await
            .unwrap();
        manager
            .assign_roles_to_user("u1", &[role.id.clone()])
            .await
            .unwrap();

        assert_eq!(manager.user_roles("u1").await.unwrap().len(), 1);
        assert_eq!(manager.users_in_role(&role.id).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn users_in_role_resolves_through_associations() {
        let (manager, _) = manager();
        manager
            .create_user(&UserRepresentation::named("alice"), "pw")
            .await
            .unwrap();
        let alice = manager.user_by_username("alice").await.unwrap().unwrap();

        let role = manager
            .create_role(&RoleRepresentation::named("Editor"))
            .await
            .unwrap();
        manager
            .assign_roles_to_user(&alice.id, &[role.id.clone()])
            .await
            .unwrap();

        let holders = manager.users_in_role(&role.id).await.unwrap();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].username, "alice");
    }

    #[tokio::test]
    async fn group_roles_resolve_through_path() {
        let (manager, store) = manager();
        let group = manager
            .create_group(&GroupRepresentation::named("writers"))
            .await
            .unwrap();
        let role = manager
            .create_role(&RoleRepresentation::named("Author"))
            .await
            .unwrap();

        manager
            .assign_roles_to_group(&group.id, &[role.id.clone()])
            .await
            .unwrap();

        let roles = manager.group_roles(&group.id).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "Author");

        // The store resolves by path, not by id.
        let by_path = store.by_group_path("/writers").await.unwrap();
        assert_eq!(by_path.len(), 1);
    }

    #[tokio::test]
    async fn update_user_keeps_existing_fields_for_blank_input() {
        let (manager, _) = manager();
        manager
            .create_user(
                &UserRepresentation {
                    username: "bob".into(),
                    email: "bob@example.com".into(),
                    first_name: "Bob".into(),
                    enabled: true,
                    ..UserRepresentation::default()
                },
                "pw",
            )
            .await
            .unwrap();
        let bob = manager.user_by_username("bob").await.unwrap().unwrap();

        let updated = manager
            .update_user(
                &bob.id,
                &UserRepresentation {
                    last_name: "Builder".into(),
                    enabled: true,
                    ..UserRepresentation::default()
                },
            )
            .await
            .unwrap();
        assert!(updated);

        let bob = manager.user_by_id(&bob.id).await.unwrap().unwrap();
        assert_eq!(bob.email, "bob@example.com");
        assert_eq!(bob.first_name, "Bob");
        assert_eq!(bob.last_name, "Builder");
    }

    #[tokio::test]
    async fn synchronize_is_a_no_op_success() {
        let (manager, _) = manager();
        assert!(manager.synchronize_users().await.unwrap());
    }
}
