//! Wire models for the Keycloak admin REST API.
//!
//! These types mirror the JSON shapes Keycloak exchanges and are converted
//! to/from the contract representations at the manager boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use bms_identity::{GroupRepresentation, RoleRepresentation, UserRepresentation};

/// Attribute key Keycloak stores the organization under.
const ORGANIZATION_ATTRIBUTE: &str = "organization";

/// A Keycloak user resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credentials: Vec<KeycloakCredential>,
}

impl KeycloakUser {
    /// Builds a wire user from a contract representation, attaching an
    /// initial password credential when given.
    #[must_use]
    pub fn from_representation(user: &UserRepresentation, password: Option<&str>) -> Self {
        let mut attributes = HashMap::new();
        if !user.organization.is_empty() {
            attributes.insert(
                ORGANIZATION_ATTRIBUTE.to_string(),
                vec![user.organization.clone()],
            );
        }

        Self {
            id: (!user.id.is_empty()).then(|| user.id.clone()),
            username: Some(user.username.clone()),
            enabled: user.enabled,
            email: (!user.email.is_empty()).then(|| user.email.clone()),
            first_name: (!user.first_name.is_empty()).then(|| user.first_name.clone()),
            last_name: (!user.last_name.is_empty()).then(|| user.last_name.clone()),
            email_verified: user.email_verified,
            attributes,
            credentials: password
                .map(|p| vec![KeycloakCredential::password(p)])
                .unwrap_or_default(),
        }
    }

    /// Converts to a contract representation.
    #[must_use]
    pub fn into_representation(self) -> UserRepresentation {
        let organization = self
            .attributes
            .get(ORGANIZATION_ATTRIBUTE)
            .and_then(|v| v.first())
            .cloned()
            .unwrap_or_default();

        UserRepresentation {
            id: self.id.unwrap_or_default(),
            username: self.username.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            organization,
            enabled: self.enabled,
            email_verified: self.email_verified,
        }
    }
}

/// A Keycloak realm role resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakRole {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub composite: bool,
    #[serde(default)]
    pub client_role: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
}

impl KeycloakRole {
    /// Converts to a contract representation.
    #[must_use]
    pub fn into_representation(self) -> RoleRepresentation {
        RoleRepresentation {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
        }
    }
}

/// A Keycloak group resource. Children arrive nested under `subGroups`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_groups: Vec<KeycloakGroup>,
}

impl KeycloakGroup {
    /// Converts to a contract representation, recursing into children.
    #[must_use]
    pub fn into_representation(self) -> GroupRepresentation {
        GroupRepresentation {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            path: self.path.unwrap_or_default(),
            parent_id: String::new(),
            sub_groups: self
                .sub_groups
                .into_iter()
                .map(Self::into_representation)
                .collect(),
        }
    }
}

/// A Keycloak credential resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakCredential {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default)]
    pub temporary: bool,
}

impl KeycloakCredential {
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

/// Response of the OpenID Connect token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_round_trips_organization_attribute() {
        let repr = UserRepresentation {
            id: "abc".into(),
            username: "alice".into(),
            organization: "ACME".into(),
            enabled: true,
            ..UserRepresentation::default()
        };

        let wire = KeycloakUser::from_representation(&repr, None);
        assert_eq!(
            wire.attributes.get(ORGANIZATION_ATTRIBUTE),
            Some(&vec!["ACME".to_string()])
        );

        let back = wire.into_representation();
        assert_eq!(back.organization, "ACME");
        assert_eq!(back.username, "alice");
    }

    #[test]
    fn password_attaches_credential() {
        let repr = UserRepresentation::named("bob");
        let wire = KeycloakUser::from_representation(&repr, Some("s3cret"));

        assert_eq!(wire.credentials.len(), 1);
        assert_eq!(wire.credentials[0].kind, "password");
        assert!(!wire.credentials[0].temporary);
    }

    #[test]
    fn group_representation_recurses() {
        let wire = KeycloakGroup {
            id: Some("g1".into()),
            name: Some("org".into()),
            path: Some("/org".into()),
            sub_groups: vec![KeycloakGroup {
                id: Some("g2".into()),
                name: Some("team".into()),
                path: Some("/org/team".into()),
                sub_groups: Vec::new(),
            }],
        };

        let repr = wire.into_representation();
        assert_eq!(repr.path, "/org");
        assert_eq!(repr.sub_groups.len(), 1);
        assert_eq!(repr.sub_groups[0].path, "/org/team");
    }

    #[test]
    fn group_parses_keycloak_json() {
        let json = r#"{"id":"g1","name":"org","path":"/org","subGroups":[]}"#;
        let group: KeycloakGroup = serde_json::from_str(json).unwrap();
        assert_eq!(group.name.as_deref(), Some("org"));
    }
}
