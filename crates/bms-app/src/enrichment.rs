//! Claims enrichment.
//!
//! Runs once per successful authentication. In proxy mode the external
//! provider only authenticates, so the roles a user effectively holds come
//! from local storage: direct assignments plus roles attached to the paths
//! of the groups the user belongs to. The enriched principal carries all
//! original claims plus the derived role claims.
//!
//! Enrichment failure must never block authentication: every error is
//! logged and the original principal is returned unchanged.

use std::sync::Arc;

use bms_identity::{
    claims, GroupStore, IdentityResult, ManagerFactory, Principal, RoleStore, UserStore,
};
use bms_model::User;

/// Post-authentication claims enrichment service.
pub struct ClaimsEnricher {
    factory: Arc<ManagerFactory>,
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    groups: Arc<dyn GroupStore>,
}

impl ClaimsEnricher {
    /// Creates an enricher over the factory (for the mode flag) and the
    /// local stores.
    #[must_use]
    pub fn new(
        factory: Arc<ManagerFactory>,
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        groups: Arc<dyn GroupStore>,
    ) -> Self {
        Self {
            factory,
            users,
            roles,
            groups,
        }
    }

    /// Processes an authenticated principal.
    ///
    /// Pass-through outside proxy mode. In proxy mode the local user record
    /// is upserted and a new principal carrying the effective role claims
    /// is returned. Any failure falls back to the original principal.
    pub async fn process(&self, principal: Principal) -> Principal {
        if !self.factory.mode().is_proxy() {
            return principal;
        }

        match self.enrich(&principal).await {
            Ok(Some(enriched)) => enriched,
            Ok(None) => principal,
            Err(err) => {
                tracing::error!(error = %err, "claims enrichment failed, keeping original principal");
                principal
            }
        }
    }

    async fn enrich(&self, principal: &Principal) -> IdentityResult<Option<Principal>> {
        let Some(subject) = principal.subject() else {
            tracing::warn!("user identifier claim not found in token");
            return Ok(None);
        };

        let username = principal
            .find_first(claims::NAME)
            .or_else(|| principal.find_first(claims::PREFERRED_USERNAME))
            .unwrap_or(subject);

        let mut user = User::new(subject, username);
        user.email = principal.find_first(claims::EMAIL).unwrap_or_default().to_string();
        user.first_name = principal
            .find_first(claims::GIVEN_NAME)
            .unwrap_or_default()
            .to_string();
        user.last_name = principal
            .find_first(claims::FAMILY_NAME)
            .unwrap_or_default()
            .to_string();
        user.organization = principal
            .find_first(claims::ORGANIZATION)
            .unwrap_or_default()
            .to_string();

        self.users.upsert(&user).await?;

        let roles = self.effective_roles(subject).await?;
        tracing::debug!(subject, roles = roles.len(), "enriched principal");

        Ok(Some(principal.with_role_claims(&roles)))
    }

    /// Resolves the effective roles for a subject: the union of directly
    /// assigned roles and roles attached to each member group's path,
    /// deduplicated by name.
    async fn effective_roles(&self, subject: &str) -> IdentityResult<Vec<String>> {
        let mut names: Vec<String> = Vec::new();

        for role in self.roles.by_user(subject).await? {
            if !names.contains(&role.name) {
                names.push(role.name);
            }
        }

        for group in self.groups.by_user(subject).await? {
            for role in self.roles.by_group_path(&group.path).await? {
                if !names.contains(&role.name) {
                    names.push(role.name);
                }
            }
        }

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use bms_identity::{
        Claim, GroupManagement, GroupRepresentation, GroupRoleManagement, IdentityMode,
        RoleManagement, RoleRepresentation, SettingStore, StoreError, StoreResult,
        UserGroupManagement, UserRoleManagement,
    };
    use bms_keycloak::{
        KeycloakAdminClient, KeycloakConfig, KeycloakIdentityManager, SafeKeycloakManager,
    };
    use bms_local::{LocalIdentityManager, MemoryStore};

    struct Env {
        enricher: ClaimsEnricher,
        factory: Arc<ManagerFactory>,
        store: Arc<MemoryStore>,
        manager: LocalIdentityManager,
    }

    async fn env(mode: IdentityMode) -> Env {
        let store = Arc::new(MemoryStore::new());

        let direct = {
            let client = KeycloakAdminClient::new(KeycloakConfig::default()).unwrap();
            Arc::new(SafeKeycloakManager::new(Arc::new(
                KeycloakIdentityManager::new(Arc::new(client)),
            )))
        };
        let proxy = Arc::new(LocalIdentityManager::new(
            Arc::clone(&store) as Arc<dyn UserStore>,
            Arc::clone(&store) as Arc<dyn RoleStore>,
            Arc::clone(&store) as Arc<dyn GroupStore>,
        ));

        let factory = Arc::new(ManagerFactory::new(
            direct,
            proxy,
            Arc::clone(&store) as Arc<dyn SettingStore>,
            mode,
        ));

        let manager = LocalIdentityManager::new(
            Arc::clone(&store) as Arc<dyn UserStore>,
            Arc::clone(&store) as Arc<dyn RoleStore>,
            Arc::clone(&store) as Arc<dyn GroupStore>,
        );

        let enricher = ClaimsEnricher::new(
            Arc::clone(&factory),
            Arc::clone(&store) as Arc<dyn UserStore>,
            Arc::clone(&store) as Arc<dyn RoleStore>,
            Arc::clone(&store) as Arc<dyn GroupStore>,
        );

        Env {
            enricher,
            factory,
            store,
            manager,
        }
    }

    fn token(subject: &str) -> Principal {
        Principal::new(vec![
            Claim::new(claims::SUBJECT, subject),
            Claim::new(claims::PREFERRED_USERNAME, "alice"),
            Claim::new(claims::EMAIL, "alice@example.com"),
            Claim::new(claims::GIVEN_NAME, "Alice"),
            Claim::new(claims::FAMILY_NAME, "Smith"),
            Claim::new(claims::ORGANIZATION, "ACME"),
        ])
    }

    #[tokio::test]
    async fn enrichment_unions_direct_and_group_roles() {
        let env = env(IdentityMode::Proxy).await;

        // Direct: Author. Group /writers grants Author and Editor.
        let author = env
            .manager
            .create_role(&RoleRepresentation::named("Author"))
            .await
            .unwrap();
        let editor = env
            .manager
            .create_role(&RoleRepresentation::named("Editor"))
            .await
            .unwrap();
        let writers = env
            .manager
            .create_group(&GroupRepresentation::named("writers"))
            .await
            .unwrap();

        env.manager
            .assign_roles_to_user("u1", &[author.id.clone()])
            .await
            .unwrap();
        env.manager
            .assign_user_to_groups("u1", &[writers.id.clone()])
            .await
            .unwrap();
        env.manager
            .assign_roles_to_group(&writers.id, &[author.id, editor.id])
            .await
            .unwrap();

        let enriched = env.enricher.process(token("u1")).await;

        // Union of direct and group-derived roles, deduplicated.
        assert_eq!(enriched.role_names(), vec!["Author", "Editor"]);
        // Both claim shapes are present per role.
        assert_eq!(enriched.values(claims::ROLE).len(), 2);
        assert_eq!(enriched.values(claims::ROLES).len(), 2);
        // Original claims are carried over.
        assert_eq!(enriched.find_first(claims::EMAIL), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn enrichment_upserts_the_local_user() {
        let env = env(IdentityMode::Proxy).await;

        env.enricher.process(token("u1")).await;

        let user = UserStore::by_id(&*env.store, "u1").await.unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.organization, "ACME");

        // A second login refreshes the record instead of duplicating it.
        env.enricher.process(token("u1")).await;
        assert_eq!(UserStore::all(&*env.store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_subject_returns_original_without_writes() {
        let env = env(IdentityMode::Proxy).await;
        let principal = Principal::new(vec![Claim::new(claims::NAME, "ghost")]);

        let result = env.enricher.process(principal.clone()).await;

        assert_eq!(result, principal);
        assert!(UserStore::all(&*env.store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn direct_mode_is_a_pass_through() {
        let env = env(IdentityMode::Direct).await;

        let principal = token("u1");
        let result = env.enricher.process(principal.clone()).await;

        assert_eq!(result, principal);
        assert!(UserStore::all(&*env.store).await.unwrap().is_empty());
    }

    /// User store that fails every operation, to prove enrichment absorbs
    /// storage errors.
    struct BrokenUserStore;

    #[async_trait]
    impl UserStore for BrokenUserStore {
        async fn all(&self) -> StoreResult<Vec<User>> {
            Err(StoreError::Connection("down".into()))
        }
        async fn by_id(&self, _: &str) -> StoreResult<Option<User>> {
            Err(StoreError::Connection("down".into()))
        }
        async fn by_username(&self, _: &str) -> StoreResult<Option<User>> {
            Err(StoreError::Connection("down".into()))
        }
        async fn by_email(&self, _: &str) -> StoreResult<Option<User>> {
            Err(StoreError::Connection("down".into()))
        }
        async fn create(&self, _: &User) -> StoreResult<()> {
            Err(StoreError::Connection("down".into()))
        }
        async fn update(&self, _: &User) -> StoreResult<()> {
            Err(StoreError::Connection("down".into()))
        }
        async fn delete(&self, _: &str) -> StoreResult<bool> {
            Err(StoreError::Connection("down".into()))
        }
        async fn upsert(&self, _: &User) -> StoreResult<User> {
            Err(StoreError::Connection("down".into()))
        }
    }

    #[tokio::test]
    async fn storage_failure_falls_back_to_original_principal() {
        let env = env(IdentityMode::Proxy).await;
        // Same proxy-mode factory, but a user store that is down.
        let enricher = ClaimsEnricher::new(
            Arc::clone(&env.factory),
            Arc::new(BrokenUserStore),
            Arc::clone(&env.store) as Arc<dyn RoleStore>,
            Arc::clone(&env.store) as Arc<dyn GroupStore>,
        );

        let principal = token("u1");
        let result = enricher.process(principal.clone()).await;

        assert_eq!(result, principal);
    }
}
