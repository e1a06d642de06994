use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::notification::{NotificationCategory, RecipientRole};

/// Audience of one dispatch.
///
/// `school_id` scopes every lookup. `role` and `recipient_ids` narrow it
/// further; with neither set the scope is everyone in the school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientScope {
    pub school_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<RecipientRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_ids: Option<Vec<String>>,
}

impl RecipientScope {
    /// Everyone in the school
    pub fn school(school_id: impl Into<String>) -> Self {
        Self {
            school_id: school_id.into(),
            role: None,
            recipient_ids: None,
        }
    }

    pub fn with_role(mut self, role: RecipientRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_recipients<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipient_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Explicit allow-list, if one narrows the scope.
    ///
    /// An empty list does not narrow anything and is treated as absent.
    pub fn recipient_filter(&self) -> Option<&[String]> {
        self.recipient_ids
            .as_deref()
            .filter(|ids| !ids.is_empty())
    }

    pub fn is_whole_school(&self) -> bool {
        self.role.is_none() && self.recipient_filter().is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// A device push token. Read-only from the dispatcher's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceToken {
    pub user_id: String,
    pub platform: Platform,
    /// Opaque provider token
    pub token: String,
    pub is_active: bool,
}

impl DeviceToken {
    pub fn active(user_id: impl Into<String>, platform: Platform, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            platform,
            token: token.into(),
            is_active: true,
        }
    }
}

/// Per-user category switches. Missing switches default to enabled.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationPreference {
    pub user_id: String,
    pub flags: HashMap<NotificationCategory, bool>,
}

impl NotificationPreference {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            flags: HashMap::new(),
        }
    }

    pub fn set(mut self, category: NotificationCategory, enabled: bool) -> Self {
        self.flags.insert(category, enabled);
        self
    }

    /// Whether this user accepts notifications of `category`.
    pub fn allows(&self, category: NotificationCategory) -> bool {
        if category.bypasses_preferences() {
            return true;
        }
        self.flags.get(&category).copied().unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_recipient_list_does_not_narrow() {
        let scope = RecipientScope::school("s1").with_recipients(Vec::<String>::new());
        assert!(scope.recipient_filter().is_none());
        assert!(scope.is_whole_school());
    }

    #[test]
    fn test_scope_builders() {
        let scope = RecipientScope::school("s1")
            .with_role(RecipientRole::Parent)
            .with_recipients(["u1", "u2"]);
        assert_eq!(scope.role, Some(RecipientRole::Parent));
        assert_eq!(scope.recipient_filter().unwrap().len(), 2);
        assert!(!scope.is_whole_school());
    }

    #[test]
    fn test_preference_defaults_to_enabled() {
        let pref = NotificationPreference::new("u1").set(NotificationCategory::Grades, false);
        assert!(!pref.allows(NotificationCategory::Grades));
        assert!(pref.allows(NotificationCategory::Events));
    }

    #[test]
    fn test_emergency_flag_is_ignored() {
        let pref = NotificationPreference::new("u1").set(NotificationCategory::Emergencies, false);
        assert!(pref.allows(NotificationCategory::Emergencies));
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("ios".parse::<Platform>().unwrap(), Platform::Ios);
        assert!("windows".parse::<Platform>().is_err());
    }
}
