//! Local user identity model.
//!
//! Users are keyed by the opaque subject identifier issued by the external
//! identity provider, shared between systems as a stable string key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A locally stored user identity.
///
/// In proxy mode this record is created on first successful authentication
/// (via upsert) and refreshed on every login. It is never auto-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque external subject identifier.
    pub id: String,
    /// Unique username.
    pub username: String,
    /// Email address (not unique).
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Organization the user belongs to.
    pub organization: String,
    /// Whether the account is enabled.
    pub enabled: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: Option<DateTime<Utc>>,
    /// When the user last logged in.
    pub last_login_at: DateTime<Utc>,
}

impl User {
    /// Creates a new enabled user with the given subject id and username.
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            username: username.into(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            organization: String::new(),
            enabled: true,
            created_at: now,
            updated_at: None,
            last_login_at: now,
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Sets the given and family names.
    #[must_use]
    pub fn with_name(
        mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    /// Sets the organization.
    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = organization.into();
        self
    }

    /// Returns the display name: "first last" if set, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.first_name.is_empty() && self.last_name.is_empty() {
            self.username.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
                .trim()
                .to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_is_enabled() {
        let user = User::new("subject-1", "alice");

        assert!(user.enabled);
        assert_eq!(user.id, "subject-1");
        assert_eq!(user.username, "alice");
        assert!(user.updated_at.is_none());
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let user = User::new("subject-1", "alice");
        assert_eq!(user.display_name(), "alice");

        let user = user.with_name("Alice", "Smith");
        assert_eq!(user.display_name(), "Alice Smith");
    }
}
