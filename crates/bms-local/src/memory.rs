//! In-memory implementation of the local store traits.
//!
//! Used by tests and embedded setups that don't want a database. Semantics
//! match the `PostgreSQL` stores: idempotent association edges, unique role
//! names and group paths, cascading subtree deletion.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use bms_identity::{
    GroupStore, RoleStore, SettingStore, StoreError, StoreResult, UserStore,
};
use bms_model::{
    group::collect_subtree, AppSetting, Group, GroupRole, Role, User, UserGroup, UserRole,
};

#[derive(Default)]
struct State {
    users: HashMap<String, User>,
    roles: HashMap<Uuid, Role>,
    groups: HashMap<Uuid, Group>,
    user_roles: Vec<UserRole>,
    user_groups: Vec<UserGroup>,
    group_roles: Vec<GroupRole>,
    settings: HashMap<String, AppSetting>,
}

/// Thread-safe in-memory store implementing all four store traits.
///
/// The interior lock is never held across an await point.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn all(&self) -> StoreResult<Vec<User>> {
        let state = self.state.read();
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn by_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self.state.read().users.get(user_id).cloned())
    }

    async fn by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .state
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .state
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: &User) -> StoreResult<()> {
        let mut state = self.state.write();
        if state.users.contains_key(&user.id) {
            return Err(StoreError::duplicate("User", "id", &user.id));
        }
        if state.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::duplicate("User", "username", &user.username));
        }
        state.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        let mut state = self.state.write();
        if !state.users.contains_key(&user.id) {
            return Err(StoreError::not_found("User", &user.id));
        }
        state.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> StoreResult<bool> {
        Ok(self.state.write().users.remove(user_id).is_some())
    }

    async fn upsert(&self, user: &User) -> StoreResult<User> {
        let mut state = self.state.write();
        let now = Utc::now();

        let stored = match state.users.get_mut(&user.id) {
            Some(existing) => {
                existing.username = user.username.clone();
                existing.email = user.email.clone();
                existing.first_name = user.first_name.clone();
                existing.last_name = user.last_name.clone();
                existing.organization = user.organization.clone();
                existing.updated_at = Some(now);
                existing.last_login_at = now;
                existing.clone()
            }
            None => {
                let mut created = user.clone();
                created.last_login_at = now;
                state.users.insert(created.id.clone(), created.clone());
                created
            }
        };

        Ok(stored)
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn create(&self, role: &Role) -> StoreResult<()> {
        let mut state = self.state.write();
        if state.roles.values().any(|r| r.name == role.name) {
            return Err(StoreError::duplicate("Role", "name", &role.name));
        }
        state.roles.insert(role.id, role.clone());
        Ok(())
    }

    async fn by_id(&self, id: Uuid) -> StoreResult<Option<Role>> {
        Ok(self.state.read().roles.get(&id).cloned())
    }

    async fn by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        Ok(self
            .state
            .read()
            .roles
            .values()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn all(&self) -> StoreResult<Vec<Role>> {
        let state = self.state.read();
        let mut roles: Vec<Role> = state.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn by_user(&self, user_id: &str) -> StoreResult<Vec<Role>> {
        let state = self.state.read();
        let mut roles: Vec<Role> = state
            .user_roles
            .iter()
            .filter(|ur| ur.user_id == user_id)
            .filter_map(|ur| state.roles.get(&ur.role_id).cloned())
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn by_group_path(&self, path: &str) -> StoreResult<Vec<Role>> {
        let state = self.state.read();
        let Some(group) = state.groups.values().find(|g| g.path == path) else {
            return Ok(Vec::new());
        };
        let mut roles: Vec<Role> = state
            .group_roles
            .iter()
            .filter(|gr| gr.group_id == group.id)
            .filter_map(|gr| state.roles.get(&gr.role_id).cloned())
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn user_ids_in_role(&self, role_id: Uuid) -> StoreResult<Vec<String>> {
        Ok(self
            .state
            .read()
            .user_roles
            .iter()
            .filter(|ur| ur.role_id == role_id)
            .map(|ur| ur.user_id.clone())
            .collect())
    }

    async fn update(&self, role: &Role) -> StoreResult<()> {
        let mut state = self.state.write();
        if !state.roles.contains_key(&role.id) {
            return Err(StoreError::not_found("Role", role.id.to_string()));
        }
        state.roles.insert(role.id, role.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write();
        state.user_roles.retain(|ur| ur.role_id != id);
        state.group_roles.retain(|gr| gr.role_id != id);
        state.roles.remove(&id);
        Ok(())
    }

    async fn add_user(&self, user_id: &str, role_id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write();
        let exists = state
            .user_roles
            .iter()
            .any(|ur| ur.user_id == user_id && ur.role_id == role_id);
        if !exists {
            state.user_roles.push(UserRole::new(user_id, role_id));
        }
        Ok(())
    }

    async fn remove_user(&self, user_id: &str, role_id: Uuid) -> StoreResult<()> {
        self.state
            .write()
            .user_roles
            .retain(|ur| !(ur.user_id == user_id && ur.role_id == role_id));
        Ok(())
    }

    async fn assign_group(&self, group_id: Uuid, role_id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write();
        let exists = state
            .group_roles
            .iter()
            .any(|gr| gr.group_id == group_id && gr.role_id == role_id);
        if !exists {
            state.group_roles.push(GroupRole::new(group_id, role_id));
        }
        Ok(())
    }

    async fn remove_group(&self, group_id: Uuid, role_id: Uuid) -> StoreResult<()> {
        self.state
            .write()
            .group_roles
            .retain(|gr| !(gr.group_id == group_id && gr.role_id == role_id));
        Ok(())
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn create(&self, group: &Group) -> StoreResult<()> {
        let mut state = self.state.write();
        if state.groups.values().any(|g| g.path == group.path) {
            return Err(StoreError::duplicate("Group", "path", &group.path));
        }
        state.groups.insert(group.id, group.clone());
        Ok(())
    }

    async fn by_id(&self, id: Uuid) -> StoreResult<Option<Group>> {
        Ok(self.state.read().groups.get(&id).cloned())
    }

    async fn by_path(&self, path: &str) -> StoreResult<Option<Group>> {
        Ok(self
            .state
            .read()
            .groups
            .values()
            .find(|g| g.path == path)
            .cloned())
    }

    async fn all(&self) -> StoreResult<Vec<Group>> {
        let state = self.state.read();
        let mut groups: Vec<Group> = state.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(groups)
    }

    async fn by_user(&self, user_id: &str) -> StoreResult<Vec<Group>> {
        let state = self.state.read();
        let mut groups: Vec<Group> = state
            .user_groups
            .iter()
            .filter(|ug| ug.user_id == user_id)
            .filter_map(|ug| state.groups.get(&ug.group_id).cloned())
            .collect();
        groups.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(groups)
    }

    async fn user_ids_in_group(&self, group_id: Uuid) -> StoreResult<Vec<String>> {
        Ok(self
            .state
            .read()
            .user_groups
            .iter()
            .filter(|ug| ug.group_id == group_id)
            .map(|ug| ug.user_id.clone())
            .collect())
    }

    async fn update(&self, group: &Group) -> StoreResult<()> {
        let mut state = self.state.write();
        if !state.groups.contains_key(&group.id) {
            return Err(StoreError::not_found("Group", group.id.to_string()));
        }
        if state
            .groups
            .values()
            .any(|g| g.id != group.id && g.path == group.path)
        {
            return Err(StoreError::duplicate("Group", "path", &group.path));
        }
        state.groups.insert(group.id, group.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write();
        let all: Vec<Group> = state.groups.values().cloned().collect();
        let subtree = collect_subtree(&all, id);

        for group in &subtree {
            state.user_groups.retain(|ug| ug.group_id != group.id);
            state.group_roles.retain(|gr| gr.group_id != group.id);
            state.groups.remove(&group.id);
        }
        Ok(())
    }

    async fn add_user(&self, user_id: &str, group_id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write();
        let exists = state
            .user_groups
            .iter()
            .any(|ug| ug.user_id == user_id && ug.group_id == group_id);
        if !exists {
            state.user_groups.push(UserGroup::new(user_id, group_id));
        }
        Ok(())
    }

    async fn remove_user(&self, user_id: &str, group_id: Uuid) -> StoreResult<()> {
        self.state
            .write()
            .user_groups
            .retain(|ug| !(ug.user_id == user_id && ug.group_id == group_id));
        Ok(())
    }
}

#[async_trait]
impl SettingStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<AppSetting>> {
        Ok(self.state.read().settings.get(key).cloned())
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> StoreResult<AppSetting> {
        let mut state = self.state.write();
        let setting = state
            .settings
            .entry(key.to_string())
            .and_modify(|s| {
                s.value = value.to_string();
                s.updated_at = Some(Utc::now());
            })
            .or_insert_with(|| AppSetting::new(key, value));
        if let Some(description) = description {
            setting.description = Some(description.to_string());
        }
        Ok(setting.clone())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(self.state.write().settings.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn association_edges_are_idempotent() {
        let store = MemoryStore::new();
        let role = Role::new("Editor");
        RoleStore::create(&store, &role).await.unwrap();

        RoleStore::add_user(&store, "u1", role.id).await.unwrap();
        RoleStore::add_user(&store, "u1", role.id).await.unwrap();

        assert_eq!(store.user_ids_in_role(role.id).await.unwrap(), vec!["u1"]);
    }

    #[tokio::test]
    async fn duplicate_role_name_is_rejected() {
        let store = MemoryStore::new();
        RoleStore::create(&store, &Role::new("Admin")).await.unwrap();

        let err = RoleStore::create(&store, &Role::new("Admin"))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn duplicate_group_path_is_rejected() {
        let store = MemoryStore::new();
        GroupStore::create(&store, &Group::new("org")).await.unwrap();

        let err = GroupStore::create(&store, &Group::new("org"))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn cascade_delete_removes_subtree_and_edges() {
        let store = MemoryStore::new();
        let root = Group::new("org");
        let child = Group::new_child(&root, "team");
        let sibling = Group::new("other");
        GroupStore::create(&store, &root).await.unwrap();
        GroupStore::create(&store, &child).await.unwrap();
        GroupStore::create(&store, &sibling).await.unwrap();

        GroupStore::add_user(&store, "u1", child.id).await.unwrap();
        let role = Role::new("Editor");
        RoleStore::create(&store, &role).await.unwrap();
        store.assign_group(child.id, role.id).await.unwrap();

        GroupStore::delete(&store, root.id).await.unwrap();

        assert!(GroupStore::by_id(&store, root.id).await.unwrap().is_none());
        assert!(GroupStore::by_id(&store, child.id).await.unwrap().is_none());
        assert!(GroupStore::by_id(&store, sibling.id).await.unwrap().is_some());
        assert!(store.user_ids_in_group(child.id).await.unwrap().is_empty());
        assert!(store.by_group_path("/org/team").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_refreshes_last_login() {
        let store = MemoryStore::new();
        let user = User::new("sub-1", "alice");
        let first = store.upsert(&user).await.unwrap();

        let mut updated = user.clone();
        updated.email = "alice@example.com".to_string();
        let second = store.upsert(&updated).await.unwrap();

        assert_eq!(second.email, "alice@example.com");
        assert!(second.last_login_at >= first.last_login_at);
        assert!(second.updated_at.is_some());
    }
}
