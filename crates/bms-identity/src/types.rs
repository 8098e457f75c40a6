//! Representation types exchanged through the identity-manager contract.
//!
//! Both backends speak these shapes. Identifiers are strings because the
//! remote provider issues opaque string ids while local storage uses UUID
//! surrogate keys; an empty string means "absent" (e.g. the placeholder
//! results returned by the safe adapter).

use serde::{Deserialize, Serialize};

use bms_model::{Group, Role, User};

/// A user as seen through the identity-manager contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    /// Opaque user identifier (empty when not yet assigned).
    #[serde(default)]
    pub id: String,
    /// Username.
    #[serde(default)]
    pub username: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Organization.
    #[serde(default)]
    pub organization: String,
    /// Whether the account is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether the email address has been verified.
    #[serde(default)]
    pub email_verified: bool,
}

impl UserRepresentation {
    /// Creates a representation with the given username.
    #[must_use]
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            enabled: true,
            ..Self::default()
        }
    }
}

impl From<User> for UserRepresentation {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            organization: user.organization,
            enabled: user.enabled,
            email_verified: false,
        }
    }
}

/// A role as seen through the identity-manager contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRepresentation {
    /// Opaque role identifier (empty when not yet assigned).
    #[serde(default)]
    pub id: String,
    /// Role name.
    #[serde(default)]
    pub name: String,
    /// Role description.
    #[serde(default)]
    pub description: String,
}

impl RoleRepresentation {
    /// Creates a representation with the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl From<Role> for RoleRepresentation {
    fn from(role: Role) -> Self {
        Self {
            id: role.id.to_string(),
            name: role.name,
            description: role.description,
        }
    }
}

/// A group as seen through the identity-manager contract.
///
/// Group listings are hierarchical: `sub_groups` holds the direct children.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRepresentation {
    /// Opaque group identifier (empty when not yet assigned).
    #[serde(default)]
    pub id: String,
    /// Group name.
    #[serde(default)]
    pub name: String,
    /// Slash-delimited path, e.g. `/parent/child`.
    #[serde(default)]
    pub path: String,
    /// Parent group identifier (empty for top-level groups).
    #[serde(default)]
    pub parent_id: String,
    /// Direct child groups.
    #[serde(default)]
    pub sub_groups: Vec<GroupRepresentation>,
}

impl GroupRepresentation {
    /// Creates a representation with the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the parent group id.
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = parent_id.into();
        self
    }
}

impl From<Group> for GroupRepresentation {
    fn from(group: Group) -> Self {
        Self {
            id: group.id.to_string(),
            name: group.name,
            path: group.path,
            parent_id: group
                .parent_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            sub_groups: Vec::new(),
        }
    }
}

/// A credential used for password reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRepresentation {
    /// Credential type, e.g. `password`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Credential value.
    pub value: String,
    /// Whether the credential must be changed at next login.
    #[serde(default)]
    pub temporary: bool,
}

impl CredentialRepresentation {
    /// Creates a permanent password credential.
    #[must_use]
    pub fn password(value: impl Into<String>) -> Self {
        Self {
            kind: "password".to_string(),
            value: value.into(),
            temporary: false,
        }
    }
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_representation_from_model() {
        let user = bms_model::User::new("subject-1", "alice")
            .with_email("alice@example.com")
            .with_name("Alice", "Smith");

        let repr = UserRepresentation::from(user);
        assert_eq!(repr.id, "subject-1");
        assert_eq!(repr.username, "alice");
        assert_eq!(repr.email, "alice@example.com");
        assert!(repr.enabled);
    }

    #[test]
    fn group_representation_keeps_path() {
        let parent = bms_model::Group::new("org");
        let child = bms_model::Group::new_child(&parent, "team");

        let repr = GroupRepresentation::from(child.clone());
        assert_eq!(repr.path, "/org/team");
        assert_eq!(repr.parent_id, parent.id.to_string());
        assert!(repr.sub_groups.is_empty());
    }

    #[test]
    fn credential_defaults_to_permanent_password() {
        let cred = CredentialRepresentation::password("s3cret");
        assert_eq!(cred.kind, "password");
        assert!(!cred.temporary);
    }
}
