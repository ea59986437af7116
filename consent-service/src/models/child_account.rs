use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::consent::{ConsentRecord, ConsentStatus};
use crate::services::restrictions::{derive_access, RestrictionPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRestrictions {
    pub betting_allowed: bool,
    pub payments_allowed: bool,
    pub full_content_access: bool,
}

impl AccessRestrictions {
    pub fn unrestricted() -> Self {
        Self {
            betting_allowed: true,
            payments_allowed: true,
            full_content_access: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub favorite_leagues: Vec<String>,
    #[serde(default = "default_notifications")]
    pub notifications: bool,
    #[serde(default)]
    pub theme: Theme,
}

fn default_notifications() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            favorite_leagues: Vec::new(),
            notifications: default_notifications(),
            theme: Theme::default(),
        }
    }
}

/// Pending parental confirmation for a data deletion. Only the hash is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionCode {
    pub code_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Wrong guesses against this code so far.
    #[serde(default)]
    pub failed_attempts: u32,
}

/// Account of a user who may be a minor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildAccount {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    pub age: i32,
    #[serde(default)]
    pub age_verified: bool,
    pub is_minor: bool,
    /// Explicit minor flag, independent of age.
    #[serde(default)]
    pub minor_flag: bool,
    pub access_restrictions: AccessRestrictions,
    #[serde(default)]
    pub account_restricted: bool,
    #[serde(default)]
    pub coppa_consent: Option<ConsentRecord>,
    #[serde(default)]
    pub kids_mode: bool,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub deletion_code: Option<DeletionCode>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    /// Optimistic concurrency counter, bumped on every persisted change.
    #[serde(default)]
    pub version: i64,
}

impl ChildAccount {
    pub fn new(email: String, age: i32, minor_flag: bool, policy: &RestrictionPolicy) -> Self {
        let now = Utc::now();
        let derived = derive_access(age, minor_flag, policy);
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            username: None,
            age,
            age_verified: false,
            is_minor: derived.is_minor,
            minor_flag,
            access_restrictions: derived.access_restrictions,
            account_restricted: false,
            coppa_consent: None,
            kids_mode: false,
            preferences: Preferences::default(),
            deletion_code: None,
            created_at: now,
            last_active: now,
            version: 0,
        }
    }

    /// Re-derive `is_minor` and the restriction set from age and minor flag.
    pub fn enforce_access_restrictions(&mut self, policy: &RestrictionPolicy) {
        let derived = derive_access(self.age, self.minor_flag, policy);
        self.is_minor = derived.is_minor;
        self.access_restrictions = derived.access_restrictions;
    }

    pub fn consent_status(&self) -> Option<ConsentStatus> {
        self.coppa_consent.as_ref().map(|c| c.status)
    }

    pub fn stored_parent_email(&self) -> Option<&str> {
        self.coppa_consent
            .as_ref()
            .and_then(|c| c.parent_email.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_derives_restrictions() {
        let child = ChildAccount::new(
            "kid@t.com".to_string(),
            12,
            false,
            &RestrictionPolicy::default(),
        );
        assert!(child.is_minor);
        assert!(!child.access_restrictions.payments_allowed);
        assert!(!child.access_restrictions.betting_allowed);
        assert!(child.coppa_consent.is_none());
        assert!(child.stored_parent_email().is_none());
    }

    #[test]
    fn test_enforce_undoes_manual_drift() {
        let policy = RestrictionPolicy::default();
        let mut child = ChildAccount::new("kid@t.com".to_string(), 15, false, &policy);
        child.access_restrictions = AccessRestrictions::unrestricted();
        child.is_minor = false;

        child.enforce_access_restrictions(&policy);

        assert!(child.is_minor);
        assert!(!child.access_restrictions.betting_allowed);
    }

    #[test]
    fn test_preferences_fill_defaults() {
        let prefs: Preferences = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        assert_eq!(prefs.theme, Theme::Dark);
        assert!(prefs.notifications);
        assert!(prefs.favorite_leagues.is_empty());
    }
}
