//! Identity and storage error types.

use thiserror::Error;

/// Errors that can occur in local storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found.
    ///
    /// Storage implementations reserve this for internal consistency
    /// violations; plain lookups surface absence as `Ok(None)`.
    #[error("entity not found: {entity} with key '{key}'")]
    NotFound {
        /// Type of entity (e.g. "User", "Group").
        entity: &'static str,
        /// Key that was looked up.
        key: String,
    },

    /// Unique constraint violation.
    #[error("duplicate {entity}: {field} '{value}' already exists")]
    Duplicate {
        /// Type of entity.
        entity: &'static str,
        /// Field that caused the conflict.
        field: &'static str,
        /// Conflicting value.
        value: String,
    },

    /// Database connection error.
    #[error("storage connection error: {0}")]
    Connection(String),

    /// Database query error.
    #[error("storage query error: {0}")]
    Query(String),

    /// Internal storage error.
    #[error("internal storage error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(
        entity: &'static str,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::Duplicate {
            entity,
            field,
            value: value.into(),
        }
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Checks if this is a duplicate error.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by identity managers.
///
/// Not-found conditions never appear here: lookups return `Ok(None)`,
/// `Ok(false)` or empty collections so call sites stay simple.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The active backend does not support this operation.
    ///
    /// Raised by the Keycloak-backed manager for role/group mutation; the
    /// safe adapter converts it into harmless defaults.
    #[error("operation not supported by this identity backend: {operation}")]
    Unsupported {
        /// Name of the unsupported operation.
        operation: &'static str,
    },

    /// A remote identity provider call failed.
    #[error("{context}: {detail}")]
    Provider {
        /// What the caller was doing.
        context: String,
        /// Underlying failure description.
        detail: String,
    },

    /// A local storage operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IdentityError {
    /// Creates an unsupported-operation error.
    #[must_use]
    pub const fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Creates a provider error with context.
    #[must_use]
    pub fn provider(context: impl Into<String>, detail: impl ToString) -> Self {
        Self::Provider {
            context: context.into(),
            detail: detail.to_string(),
        }
    }

    /// Checks if this is an unsupported-operation error.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Result type for identity manager operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_predicates() {
        let err = StoreError::not_found("User", "abc");
        assert!(err.is_not_found());
        assert!(!err.is_duplicate());

        let err = StoreError::duplicate("Role", "name", "Admin");
        assert!(err.is_duplicate());
        assert!(err.to_string().contains("Admin"));
    }

    #[test]
    fn identity_error_wraps_store_error() {
        let err: IdentityError = StoreError::Query("boom".into()).into();
        assert!(matches!(err, IdentityError::Store(_)));
        assert!(!err.is_unsupported());
    }

    #[test]
    fn unsupported_names_the_operation() {
        let err = IdentityError::unsupported("create_role");
        assert!(err.is_unsupported());
        assert!(err.to_string().contains("create_role"));
    }
}
