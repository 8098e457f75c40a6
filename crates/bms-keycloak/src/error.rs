//! Keycloak client error types.

use bms_identity::IdentityError;
use thiserror::Error;

/// Errors that can occur when talking to the Keycloak admin API.
#[derive(Debug, Error)]
pub enum KeycloakError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Token exchange with the provider failed.
    #[error("failed to authenticate with Keycloak: {0}")]
    Token(String),

    /// Transport-level failure (connection, timeout, body decoding).
    #[error("{context}: {source}")]
    Http {
        /// What the caller was doing.
        context: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The admin API answered with an unexpected status.
    ///
    /// 404 responses on single-entity lookups never reach this variant;
    /// they are translated to `None` by the client.
    #[error("{context}: Keycloak responded with status {status}")]
    Api {
        /// What the caller was doing.
        context: String,
        /// HTTP status code.
        status: u16,
    },
}

impl KeycloakError {
    /// Wraps a transport error with context.
    #[must_use]
    pub fn http(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            context: context.into(),
            source,
        }
    }

    /// Creates an API-status error with context.
    #[must_use]
    pub fn api(context: impl Into<String>, status: u16) -> Self {
        Self::Api {
            context: context.into(),
            status,
        }
    }
}

impl From<KeycloakError> for IdentityError {
    fn from(err: KeycloakError) -> Self {
        match err {
            KeycloakError::Http { context, source } => Self::provider(context, source),
            KeycloakError::Api { context, status } => {
                Self::provider(context, format!("Keycloak responded with status {status}"))
            }
            KeycloakError::Token(detail) => {
                Self::provider("failed to authenticate with Keycloak", detail)
            }
            KeycloakError::Configuration(detail) => {
                Self::provider("invalid Keycloak configuration", detail)
            }
        }
    }
}

/// Result type for Keycloak client operations.
pub type KeycloakResult<T> = Result<T, KeycloakError>;
