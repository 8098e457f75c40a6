//! Keycloak connection configuration.

use std::time::Duration;

use url::Url;

use crate::error::{KeycloakError, KeycloakResult};

/// Configuration for the Keycloak admin API connection.
#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    /// Base URL of the Keycloak server, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Realm to administer.
    pub realm: String,
    /// Admin username for the password grant.
    pub admin_username: String,
    /// Admin password for the password grant.
    pub admin_password: String,
    /// OAuth client id used for the token exchange.
    pub client_id: String,
    /// Safety margin subtracted from the token lifetime; the token is
    /// refreshed once it is within this margin of expiry.
    pub token_expiry_margin: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for KeycloakConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            realm: "master".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "admin".to_string(),
            client_id: "admin-cli".to_string(),
            token_expiry_margin: Duration::from_secs(60),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl KeycloakConfig {
    /// Creates a configuration for the given server and realm.
    #[must_use]
    pub fn new(base_url: impl Into<String>, realm: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            realm: realm.into(),
            ..Self::default()
        }
    }

    /// Sets the admin credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.admin_username = username.into();
        self.admin_password = password.into();
        self
    }

    /// Sets the OAuth client id.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Sets the token expiry safety margin.
    #[must_use]
    pub const fn with_token_expiry_margin(mut self, margin: Duration) -> Self {
        self.token_expiry_margin = margin;
        self
    }

    /// Loads configuration from `BMS_KEYCLOAK_*` environment variables,
    /// falling back to defaults for anything unset.
    ///
    /// ## Errors
    ///
    /// Returns an error if the resulting configuration fails validation.
    pub fn from_env() -> KeycloakResult<Self> {
        // Load .env if present.
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let config = Self {
            base_url: std::env::var("BMS_KEYCLOAK_BASE_URL").unwrap_or(defaults.base_url),
            realm: std::env::var("BMS_KEYCLOAK_REALM").unwrap_or(defaults.realm),
            admin_username: std::env::var("BMS_KEYCLOAK_ADMIN_USERNAME")
                .unwrap_or(defaults.admin_username),
            admin_password: std::env::var("BMS_KEYCLOAK_ADMIN_PASSWORD")
                .unwrap_or(defaults.admin_password),
            client_id: std::env::var("BMS_KEYCLOAK_CLIENT_ID").unwrap_or(defaults.client_id),
            token_expiry_margin: defaults.token_expiry_margin,
            request_timeout: defaults.request_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// ## Errors
    ///
    /// Returns an error if the base URL is not a valid http(s) URL or the
    /// realm is empty.
    pub fn validate(&self) -> KeycloakResult<()> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            KeycloakError::Configuration(format!("invalid base URL '{}': {e}", self.base_url))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(KeycloakError::Configuration(format!(
                "base URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.realm.is_empty() {
            return Err(KeycloakError::Configuration(
                "realm must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(KeycloakConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let config = KeycloakConfig::new("ldap://keycloak.example.com", "master");
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_realm() {
        let config = KeycloakConfig::new("http://localhost:8080", "");
        assert!(config.validate().is_err());
    }
}
