//! Role domain model.
//!
//! Roles carry a globally unique name and are attached to users directly
//! or inherited through group membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A role that can be assigned to users and groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Unique identifier.
    pub id: Uuid,
    /// Unique role name.
    pub name: String,
    /// Role description.
    pub description: String,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
    /// When the role was last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Role {
    /// Creates a new role with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            description: String::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A direct user-to-role assignment.
///
/// The (`user_id`, `role_id`) pair is unique; adding an existing pair is a
/// no-op for the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    /// Subject identifier of the user.
    pub user_id: String,
    /// Identifier of the assigned role.
    pub role_id: Uuid,
    /// When the assignment was created.
    pub created_at: DateTime<Utc>,
}

impl UserRole {
    /// Creates a new assignment stamped with the current time.
    #[must_use]
    pub fn new(user_id: impl Into<String>, role_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            role_id,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_creation() {
        let role = Role::new("Editor").with_description("Can approve posts");

        assert_eq!(role.name, "Editor");
        assert_eq!(role.description, "Can approve posts");
        assert!(role.updated_at.is_none());
    }
}
