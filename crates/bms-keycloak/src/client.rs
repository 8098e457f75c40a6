//! HTTP client for the Keycloak admin REST API.
//!
//! Authentication uses the password grant against the realm token endpoint.
//! The bearer token is cached and refreshed lazily once it is within a
//! safety margin of expiry; refreshing happens under a lock so concurrent
//! calls racing past expiry produce a single token request.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::KeycloakConfig;
use crate::error::{KeycloakError, KeycloakResult};
use crate::models::{KeycloakCredential, KeycloakGroup, KeycloakRole, KeycloakUser, TokenResponse};

/// A cached bearer token.
#[derive(Debug, Clone)]
struct BearerToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Client for the Keycloak admin REST API.
pub struct KeycloakAdminClient {
    http: reqwest::Client,
    config: KeycloakConfig,
    token: Mutex<Option<BearerToken>>,
}

impl KeycloakAdminClient {
    /// Creates a new client. No connection is made until the first call.
    ///
    /// ## Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(config: KeycloakConfig) -> KeycloakResult<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| KeycloakError::Configuration(e.to_string()))?;

        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
        })
    }

    /// Returns a valid bearer token, refreshing it if needed.
    ///
    /// The whole check-and-refresh runs under the token mutex, so a
    /// stampede of expired callers results in exactly one token request.
    async fn bearer(&self) -> KeycloakResult<String> {
        let margin = ChronoDuration::from_std(self.config.token_expiry_margin)
            .unwrap_or_else(|_| ChronoDuration::seconds(60));

        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if Utc::now() + margin < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *guard = Some(token);
        Ok(access_token)
    }

    async fn request_token(&self) -> KeycloakResult<BearerToken> {
        let url = format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.config.base_url, self.config.realm
        );
        let form = [
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("username", self.config.admin_username.as_str()),
            ("password", self.config.admin_password.as_str()),
        ];

        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| KeycloakError::Token(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeycloakError::Token(format!(
                "token endpoint responded with status {}",
                response.status().as_u16()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| KeycloakError::Token(e.to_string()))?;

        tracing::debug!(realm = %self.config.realm, "obtained admin token");

        Ok(BearerToken {
            access_token: token.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(token.expires_in as i64),
        })
    }

    fn admin_url(&self, path: &str) -> String {
        format!(
            "{}/admin/realms/{}{path}",
            self.config.base_url, self.config.realm
        )
    }

    /// Sends a GET and decodes the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        context: &str,
    ) -> KeycloakResult<T> {
        match self.get_optional(path, context).await? {
            Some(value) => Ok(value),
            None => Err(KeycloakError::api(context, StatusCode::NOT_FOUND.as_u16())),
        }
    }

    /// Sends a GET, translating a 404 into `None`.
    async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        context: &str,
    ) -> KeycloakResult<Option<T>> {
        let token = self.bearer().await?;
        let response = self
            .http
            .get(self.admin_url(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| KeycloakError::http(context, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(KeycloakError::api(context, response.status().as_u16()));
        }

        let value = response
            .json()
            .await
            .map_err(|e| KeycloakError::http(context, e))?;
        Ok(Some(value))
    }

    /// Sends a request with an optional JSON body, expecting a success
    /// status and no meaningful body.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        context: &str,
    ) -> KeycloakResult<()> {
        let token = self.bearer().await?;
        let mut request = self
            .http
            .request(method, self.admin_url(path))
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| KeycloakError::http(context, e))?;

        if !response.status().is_success() {
            return Err(KeycloakError::api(context, response.status().as_u16()));
        }
        Ok(())
    }

    // === Users ===

    /// Lists all users in the realm.
    pub async fn users(&self) -> KeycloakResult<Vec<KeycloakUser>> {
        self.get_json("/users", "failed to get users from Keycloak")
            .await
    }

    /// Gets a user by id; 404 yields `None`.
    pub async fn user_by_id(&self, user_id: &str) -> KeycloakResult<Option<KeycloakUser>> {
        self.get_optional(
            &format!("/users/{user_id}"),
            "failed to get user from Keycloak",
        )
        .await
    }

    /// Searches users by username (Keycloak matches loosely; callers filter
    /// for exact matches).
    pub async fn users_by_username(
        &self,
        username: &str,
    ) -> KeycloakResult<Vec<KeycloakUser>> {
        self.get_json(
            &format!("/users?username={username}"),
            "failed to search users in Keycloak",
        )
        .await
    }

    /// Creates a user.
    pub async fn create_user(&self, user: &KeycloakUser) -> KeycloakResult<()> {
        self.send(
            Method::POST,
            "/users",
            Some(user),
            "failed to create user in Keycloak",
        )
        .await
    }

    /// Updates a user.
    pub async fn update_user(&self, user_id: &str, user: &KeycloakUser) -> KeycloakResult<()> {
        self.send(
            Method::PUT,
            &format!("/users/{user_id}"),
            Some(user),
            "failed to update user in Keycloak",
        )
        .await
    }

    /// Deletes a user.
    pub async fn delete_user(&self, user_id: &str) -> KeycloakResult<()> {
        self.send::<()>(
            Method::DELETE,
            &format!("/users/{user_id}"),
            None,
            "failed to delete user from Keycloak",
        )
        .await
    }

    /// Resets a user's password.
    pub async fn reset_password(
        &self,
        user_id: &str,
        credential: &KeycloakCredential,
    ) -> KeycloakResult<()> {
        self.send(
            Method::PUT,
            &format!("/users/{user_id}/reset-password"),
            Some(credential),
            "failed to reset password in Keycloak",
        )
        .await
    }

    // === Roles ===

    /// Lists all realm roles.
    pub async fn roles(&self) -> KeycloakResult<Vec<KeycloakRole>> {
        self.get_json("/roles", "failed to get roles from Keycloak")
            .await
    }

    /// Gets a realm role by name; 404 yields `None`.
    pub async fn role_by_name(&self, name: &str) -> KeycloakResult<Option<KeycloakRole>> {
        self.get_optional(
            &format!("/roles/{name}"),
            "failed to get role from Keycloak",
        )
        .await
    }

    /// Gets the realm roles mapped to a user.
    pub async fn user_realm_roles(&self, user_id: &str) -> KeycloakResult<Vec<KeycloakRole>> {
        self.get_json(
            &format!("/users/{user_id}/role-mappings/realm"),
            "failed to get user roles from Keycloak",
        )
        .await
    }

    /// Adds realm role mappings to a user.
    pub async fn add_user_realm_roles(
        &self,
        user_id: &str,
        roles: &[KeycloakRole],
    ) -> KeycloakResult<()> {
        self.send(
            Method::POST,
            &format!("/users/{user_id}/role-mappings/realm"),
            Some(roles),
            "failed to assign roles in Keycloak",
        )
        .await
    }

    /// Removes realm role mappings from a user.
    pub async fn remove_user_realm_roles(
        &self,
        user_id: &str,
        roles: &[KeycloakRole],
    ) -> KeycloakResult<()> {
        self.send(
            Method::DELETE,
            &format!("/users/{user_id}/role-mappings/realm"),
            Some(roles),
            "failed to remove roles in Keycloak",
        )
        .await
    }

    // === Groups ===

    /// Lists all groups (hierarchical, children under `subGroups`).
    pub async fn groups(&self) -> KeycloakResult<Vec<KeycloakGroup>> {
        self.get_json("/groups", "failed to get groups from Keycloak")
            .await
    }

    /// Gets a group by id; 404 yields `None`.
    pub async fn group_by_id(&self, group_id: &str) -> KeycloakResult<Option<KeycloakGroup>> {
        self.get_optional(
            &format!("/groups/{group_id}"),
            "failed to get group from Keycloak",
        )
        .await
    }

    /// Gets the groups a user belongs to.
    pub async fn user_groups(&self, user_id: &str) -> KeycloakResult<Vec<KeycloakGroup>> {
        self.get_json(
            &format!("/users/{user_id}/groups"),
            "failed to get user groups from Keycloak",
        )
        .await
    }

    /// Adds a user to a group.
    pub async fn add_user_to_group(
        &self,
        user_id: &str,
        group_id: &str,
    ) -> KeycloakResult<()> {
        self.send::<()>(
            Method::PUT,
            &format!("/users/{user_id}/groups/{group_id}"),
            None,
            "failed to add user to group in Keycloak",
        )
        .await
    }

    /// Removes a user from a group.
    pub async fn remove_user_from_group(
        &self,
        user_id: &str,
        group_id: &str,
    ) -> KeycloakResult<()> {
        self.send::<()>(
            Method::DELETE,
            &format!("/users/{user_id}/groups/{group_id}"),
            None,
            "failed to remove user from group in Keycloak",
        )
        .await
    }
}
