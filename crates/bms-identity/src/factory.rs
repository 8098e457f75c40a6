//! Identity manager factory and mode selection.
//!
//! The factory owns the process-wide mode flag and a cached reference to
//! the active manager. Switching modes replaces the cached reference as a
//! whole value; concurrent requests may briefly observe the previous
//! manager during a switch, but never a partially-updated state.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::IdentityResult;
use crate::manager::IdentityManager;
use crate::store::SettingStore;

/// Setting key under which the mode flag is persisted.
pub const MODE_SETTING_KEY: &str = "identity.use_proxy_manager";

/// Operating mode of the identity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMode {
    /// The external provider is the sole source of truth for users, roles
    /// and groups.
    Direct,
    /// The external provider performs only authentication; local storage is
    /// authoritative for roles and groups.
    Proxy,
}

impl IdentityMode {
    /// Maps the persisted boolean flag to a mode.
    #[must_use]
    pub const fn from_proxy_flag(use_proxy: bool) -> Self {
        if use_proxy {
            Self::Proxy
        } else {
            Self::Direct
        }
    }

    /// Whether this mode uses the local/proxy manager.
    #[must_use]
    pub const fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy)
    }
}

impl fmt::Display for IdentityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Proxy => f.write_str("proxy"),
        }
    }
}

/// Resolves, caches and switches between the two identity manager
/// implementations.
///
/// The factory is keyed by the explicit [`IdentityMode`] enum rather than a
/// string, and is safe to share across request handlers.
pub struct ManagerFactory {
    direct: Arc<dyn IdentityManager>,
    proxy: Arc<dyn IdentityManager>,
    settings: Arc<dyn SettingStore>,
    mode: RwLock<IdentityMode>,
    cached: RwLock<Option<Arc<dyn IdentityManager>>>,
}

impl ManagerFactory {
    /// Creates a factory over the two backend managers.
    ///
    /// `default_mode` is the configured startup mode; a persisted setting
    /// applied via [`load_persisted_mode`](Self::load_persisted_mode)
    /// supersedes it.
    #[must_use]
    pub fn new(
        direct: Arc<dyn IdentityManager>,
        proxy: Arc<dyn IdentityManager>,
        settings: Arc<dyn SettingStore>,
        default_mode: IdentityMode,
    ) -> Self {
        Self {
            direct,
            proxy,
            settings,
            mode: RwLock::new(default_mode),
            cached: RwLock::new(None),
        }
    }

    /// Returns the current mode.
    #[must_use]
    pub fn mode(&self) -> IdentityMode {
        *self.mode.read()
    }

    /// Applies the persisted mode flag over the configured default and
    /// clears the cached manager. Called once at startup.
    ///
    /// ## Errors
    ///
    /// Returns an error if the setting store is unavailable.
    pub async fn load_persisted_mode(&self) -> IdentityResult<IdentityMode> {
        let default = self.mode().is_proxy();
        let use_proxy = self.settings.get_bool(MODE_SETTING_KEY, default).await?;
        let mode = IdentityMode::from_proxy_flag(use_proxy);

        *self.mode.write() = mode;
        *self.cached.write() = None;

        tracing::debug!(%mode, "loaded persisted identity mode");
        Ok(mode)
    }

    /// Returns the manager for the requested mode, regardless of the cached
    /// one.
    #[must_use]
    pub fn manager_for(&self, mode: IdentityMode) -> Arc<dyn IdentityManager> {
        match mode {
            IdentityMode::Direct => Arc::clone(&self.direct),
            IdentityMode::Proxy => Arc::clone(&self.proxy),
        }
    }

    /// Returns the manager reflecting the current mode, lazily resolving
    /// and caching it on first access.
    #[must_use]
    pub fn current_manager(&self) -> Arc<dyn IdentityManager> {
        if let Some(manager) = self.cached.read().as_ref() {
            return Arc::clone(manager);
        }

        let manager = self.manager_for(self.mode());
        *self.cached.write() = Some(Arc::clone(&manager));
        manager
    }

    /// Switches to `mode`: persists the flag, updates the mode and replaces
    /// the cached manager with an eagerly resolved one, so the next access
    /// to [`current_manager`](Self::current_manager) reflects the switch.
    ///
    /// Repeated calls with the same mode have no side effects beyond
    /// rewriting the flag and reconstructing the cache entry.
    ///
    /// ## Errors
    ///
    /// Returns an error if persisting the flag fails; the in-memory mode is
    /// left unchanged in that case.
    pub async fn initialize(&self, mode: IdentityMode) -> IdentityResult<()> {
        self.settings
            .set(
                MODE_SETTING_KEY,
                &mode.is_proxy().to_string(),
                Some("Whether the local/proxy identity manager is authoritative"),
            )
            .await?;

        *self.mode.write() = mode;
        *self.cached.write() = Some(self.manager_for(mode));

        tracing::info!(%mode, "identity mode initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    use crate::error::{IdentityResult, StoreResult};
    use crate::manager::{
        GroupManagement, GroupRoleManagement, IdentitySynchronization, RoleManagement,
        UserGroupManagement, UserManagement, UserRoleManagement,
    };
    use crate::types::{
        CredentialRepresentation, GroupRepresentation, RoleRepresentation, UserRepresentation,
    };
    use bms_model::AppSetting;

    /// Manager stub whose capability flags identify the backing mode.
    struct StubManager {
        creates_roles: bool,
    }

    #[async_trait]
    impl UserManagement for StubManager {
        fn supports_user_creation(&self) -> bool {
            true
        }
        async fn users(&self) -> IdentityResult<Vec<UserRepresentation>> {
            Ok(Vec::new())
        }
        async fn user_by_id(&self, _: &str) -> IdentityResult<Option<UserRepresentation>> {
            Ok(None)
        }
        async fn user_by_username(
            &self,
            _: &str,
        ) -> IdentityResult<Option<UserRepresentation>> {
            Ok(None)
        }
        async fn create_user(&self, _: &UserRepresentation, _: &str) -> IdentityResult<bool> {
            Ok(true)
        }
        async fn update_user(&self, _: &str, _: &UserRepresentation) -> IdentityResult<bool> {
            Ok(true)
        }
        async fn delete_user(&self, _: &str) -> IdentityResult<bool> {
            Ok(true)
        }
        async fn reset_password(
            &self,
            _: &str,
            _: &CredentialRepresentation,
        ) -> IdentityResult<bool> {
            Ok(true)
        }
    }

    #[async_trait]
    impl RoleManagement for StubManager {
        fn supports_direct_role_creation(&self) -> bool {
            self.creates_roles
        }
        async fn roles(&self) -> IdentityResult<Vec<RoleRepresentation>> {
            Ok(Vec::new())
        }
        async fn role_by_id(&self, _: &str) -> IdentityResult<Option<RoleRepresentation>> {
            Ok(None)
        }
        async fn role_by_name(&self, _: &str) -> IdentityResult<Option<RoleRepresentation>> {
            Ok(None)
        }
        async fn create_role(
            &self,
            role: &RoleRepresentation,
        ) -> IdentityResult<RoleRepresentation> {
            Ok(role.clone())
        }
        async fn update_role(&self, _: &str, _: &RoleRepresentation) -> IdentityResult<bool> {
            Ok(true)
        }
        async fn delete_role(&self, _: &str) -> IdentityResult<bool> {
            Ok(true)
        }
    }

    #[async_trait]
    impl UserRoleManagement for StubManager {
        async fn assign_roles_to_user(&self, _: &str, _: &[String]) -> IdentityResult<bool> {
            Ok(true)
        }
        async fn remove_roles_from_user(&self, _: &str, _: &[String]) -> IdentityResult<bool> {
            Ok(true)
        }
        async fn user_roles(&self, _: &str) -> IdentityResult<Vec<RoleRepresentation>> {
            Ok(Vec::new())
        }
        async fn users_in_role(&self, _: &str) -> IdentityResult<Vec<UserRepresentation>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl GroupManagement for StubManager {
        fn supports_direct_group_creation(&self) -> bool {
            self.creates_roles
        }
        async fn groups(&self) -> IdentityResult<Vec<GroupRepresentation>> {
            Ok(Vec::new())
        }
        async fn group_by_id(&self, _: &str) -> IdentityResult<Option<GroupRepresentation>> {
            Ok(None)
        }
        async fn group_by_path(&self, _: &str) -> IdentityResult<Option<GroupRepresentation>> {
            Ok(None)
        }
        async fn create_group(
            &self,
            group: &GroupRepresentation,
        ) -> IdentityResult<GroupRepresentation> {
            Ok(group.clone())
        }
        async fn update_group(
            &self,
            _: &str,
            _: &GroupRepresentation,
        ) -> IdentityResult<bool> {
            Ok(true)
        }
        async fn delete_group(&self, _: &str) -> IdentityResult<bool> {
            Ok(true)
        }
    }

    #[async_trait]
    impl UserGroupManagement for StubManager {
        async fn assign_user_to_groups(&self, _: &str, _: &[String]) -> IdentityResult<bool> {
            Ok(true)
        }
        async fn remove_user_from_groups(
            &self,
            _: &str,
            _: &[String],
        ) -> IdentityResult<bool> {
            Ok(true)
        }
        async fn user_groups(&self, _: &str) -> IdentityResult<Vec<String>> {
            Ok(Vec::new())
        }
        async fn users_in_group(&self, _: &str) -> IdentityResult<Vec<UserRepresentation>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl GroupRoleManagement for StubManager {
        async fn group_roles(&self, _: &str) -> IdentityResult<Vec<RoleRepresentation>> {
            Ok(Vec::new())
        }
        async fn assign_roles_to_group(&self, _: &str, _: &[String]) -> IdentityResult<bool> {
            Ok(true)
        }
        async fn remove_roles_from_group(
            &self,
            _: &str,
            _: &[String],
        ) -> IdentityResult<bool> {
            Ok(true)
        }
    }

    #[async_trait]
    impl IdentitySynchronization for StubManager {
        async fn synchronize_users(&self) -> IdentityResult<bool> {
            Ok(true)
        }
    }

    #[derive(Default)]
    struct MemorySettings {
        values: Mutex<HashMap<String, AppSetting>>,
    }

    #[async_trait]
    impl SettingStore for MemorySettings {
        async fn get(&self, key: &str) -> StoreResult<Option<AppSetting>> {
            Ok(self.values.lock().get(key).cloned())
        }

        async fn set(
            &self,
            key: &str,
            value: &str,
            description: Option<&str>,
        ) -> StoreResult<AppSetting> {
            let mut values = self.values.lock();
            let setting = values
                .entry(key.to_string())
                .and_modify(|s| {
                    s.value = value.to_string();
                    s.updated_at = Some(chrono::Utc::now());
                })
                .or_insert_with(|| AppSetting::new(key, value));
            if let Some(description) = description {
                setting.description = Some(description.to_string());
            }
            Ok(setting.clone())
        }

        async fn delete(&self, key: &str) -> StoreResult<bool> {
            Ok(self.values.lock().remove(key).is_some())
        }
    }

    fn factory(default_mode: IdentityMode) -> (ManagerFactory, Arc<MemorySettings>) {
        let settings = Arc::new(MemorySettings::default());
        let factory = ManagerFactory::new(
            // The stub standing in for Keycloak cannot create roles directly.
            Arc::new(StubManager {
                creates_roles: false,
            }),
            Arc::new(StubManager {
                creates_roles: true,
            }),
            Arc::clone(&settings) as Arc<dyn SettingStore>,
            default_mode,
        );
        (factory, settings)
    }

    #[tokio::test]
    async fn initialize_switches_current_manager() {
        let (factory, _) = factory(IdentityMode::Direct);
        assert!(!factory.current_manager().supports_direct_role_creation());

        factory.initialize(IdentityMode::Proxy).await.unwrap();
        assert_eq!(factory.mode(), IdentityMode::Proxy);
        assert!(factory.current_manager().supports_direct_role_creation());

        factory.initialize(IdentityMode::Direct).await.unwrap();
        assert!(!factory.current_manager().supports_direct_role_creation());
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let (factory, settings) = factory(IdentityMode::Direct);

        factory.initialize(IdentityMode::Proxy).await.unwrap();
        factory.initialize(IdentityMode::Proxy).await.unwrap();

        assert_eq!(factory.mode(), IdentityMode::Proxy);
        assert!(factory.current_manager().supports_direct_role_creation());

        let stored = settings.get(MODE_SETTING_KEY).await.unwrap().unwrap();
        assert_eq!(stored.as_bool(), Some(true));
    }

    #[tokio::test]
    async fn manager_for_ignores_cache() {
        let (factory, _) = factory(IdentityMode::Direct);
        let _ = factory.current_manager();

        let proxy = factory.manager_for(IdentityMode::Proxy);
        assert!(proxy.supports_direct_role_creation());
        // The cached manager is still the direct one.
        assert!(!factory.current_manager().supports_direct_role_creation());
    }

    #[tokio::test]
    async fn persisted_mode_supersedes_default() {
        let (factory, settings) = factory(IdentityMode::Direct);
        settings
            .set(MODE_SETTING_KEY, "true", None)
            .await
            .unwrap();

        let mode = factory.load_persisted_mode().await.unwrap();
        assert_eq!(mode, IdentityMode::Proxy);
        assert!(factory.current_manager().supports_direct_role_creation());
    }

    #[tokio::test]
    async fn missing_persisted_mode_keeps_default() {
        let (factory, _) = factory(IdentityMode::Proxy);
        let mode = factory.load_persisted_mode().await.unwrap();
        assert_eq!(mode, IdentityMode::Proxy);
    }
}
