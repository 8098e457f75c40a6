//! Application setting model.
//!
//! Settings are key/value rows used for configuration that must survive
//! restarts and be mutable at runtime, such as the identity mode flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted configuration setting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSetting {
    /// Unique identifier.
    pub id: Uuid,
    /// Unique setting key.
    pub key: String,
    /// Setting value, stored as a string.
    pub value: String,
    /// Optional human-readable description.
    pub description: Option<String>,
    /// When the setting was created.
    pub created_at: DateTime<Utc>,
    /// When the setting was last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl AppSetting {
    /// Creates a new setting.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            key: key.into(),
            value: value.into(),
            description: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parses the value as a boolean, if possible.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.value.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_parsing() {
        let setting = AppSetting::new("identity.use_proxy_manager", "true");
        assert_eq!(setting.as_bool(), Some(true));

        let setting = AppSetting::new("key", "not-a-bool");
        assert_eq!(setting.as_bool(), None);
    }
}
