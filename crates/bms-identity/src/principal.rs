//! Principal and claim modeling.
//!
//! A [`Principal`] is the authenticated identity's full claim set for the
//! current request. Claims enrichment never mutates a principal in place:
//! it produces a new value carrying the original claims plus the derived
//! role claims.

use serde::{Deserialize, Serialize};

/// Well-known claim names.
pub mod claims {
    /// Primary subject identifier claim.
    pub const SUBJECT: &str = "sub";
    /// Alternate subject identifier claim, kept for tokens that carry the
    /// identifier under the legacy name.
    pub const NAME_ID: &str = "nameid";
    /// Display name.
    pub const NAME: &str = "name";
    /// Preferred username.
    pub const PREFERRED_USERNAME: &str = "preferred_username";
    /// Email address.
    pub const EMAIL: &str = "email";
    /// Given name.
    pub const GIVEN_NAME: &str = "given_name";
    /// Family name.
    pub const FAMILY_NAME: &str = "family_name";
    /// Organization.
    pub const ORGANIZATION: &str = "organization";
    /// Standard role claim.
    pub const ROLE: &str = "role";
    /// Plain "roles" claim, kept for compatibility with role-claim-type
    /// configuration elsewhere in the stack.
    pub const ROLES: &str = "roles";
}

/// A single name/value claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Claim name, e.g. `sub` or `role`.
    pub name: String,
    /// Claim value.
    pub value: String,
}

impl Claim {
    /// Creates a new claim.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An authenticated identity's claim set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    claims: Vec<Claim>,
}

impl Principal {
    /// Creates a principal from a claim list.
    #[must_use]
    pub fn new(claims: Vec<Claim>) -> Self {
        Self { claims }
    }

    /// Returns the full claim list.
    #[must_use]
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Returns the first value of the named claim.
    #[must_use]
    pub fn find_first(&self, name: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// Returns all values of the named claim.
    #[must_use]
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.claims
            .iter()
            .filter(|c| c.name == name)
            .map(|c| c.value.as_str())
            .collect()
    }

    /// Returns the subject identifier: the `sub` claim, falling back to the
    /// alternate `nameid` claim.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.find_first(claims::SUBJECT)
            .or_else(|| self.find_first(claims::NAME_ID))
    }

    /// Checks whether the principal holds a role claim with the given value.
    #[must_use]
    pub fn is_in_role(&self, role: &str) -> bool {
        self.claims
            .iter()
            .any(|c| (c.name == claims::ROLE || c.name == claims::ROLES) && c.value == role)
    }

    /// Returns the distinct role names held by this principal.
    #[must_use]
    pub fn role_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for claim in &self.claims {
            if (claim.name == claims::ROLE || claim.name == claims::ROLES)
                && !names.contains(&claim.value.as_str())
            {
                names.push(claim.value.as_str());
            }
        }
        names
    }

    /// Produces a new principal carrying all original claims plus, per role
    /// name, a standard role claim and a plain `roles` claim.
    #[must_use]
    pub fn with_role_claims(&self, roles: &[String]) -> Self {
        let mut extended = self.claims.clone();
        for role in roles {
            extended.push(Claim::new(claims::ROLE, role.clone()));
            extended.push(Claim::new(claims::ROLES, role.clone()));
        }
        Self { claims: extended }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_falls_back_to_name_id() {
        let principal = Principal::new(vec![Claim::new(claims::NAME_ID, "u1")]);
        assert_eq!(principal.subject(), Some("u1"));

        let principal = Principal::new(vec![
            Claim::new(claims::SUBJECT, "primary"),
            Claim::new(claims::NAME_ID, "legacy"),
        ]);
        assert_eq!(principal.subject(), Some("primary"));

        assert_eq!(Principal::default().subject(), None);
    }

    #[test]
    fn role_claims_come_in_pairs() {
        let principal = Principal::new(vec![Claim::new(claims::SUBJECT, "u1")]);
        let enriched =
            principal.with_role_claims(&["Admin".to_string(), "Author".to_string()]);

        // Original untouched.
        assert_eq!(principal.claims().len(), 1);
        // 1 original + 2 per role.
        assert_eq!(enriched.claims().len(), 5);
        assert!(enriched.is_in_role("Admin"));
        assert!(enriched.is_in_role("Author"));
        assert_eq!(enriched.values(claims::ROLES), vec!["Admin", "Author"]);
    }

    #[test]
    fn role_names_are_distinct() {
        let principal = Principal::default().with_role_claims(&["Editor".to_string()]);
        // `role` and `roles` carry the same value; it must appear once.
        assert_eq!(principal.role_names(), vec!["Editor"]);
    }
}
