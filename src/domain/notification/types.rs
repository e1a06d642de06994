use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of a notification.
///
/// Selects which preference flag gates delivery. `Emergencies` is never
/// gated: users cannot opt out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Announcements,
    Assignments,
    Grades,
    Attendance,
    Events,
    Messages,
    Reminders,
    Emergencies,
}

impl NotificationCategory {
    pub const ALL: [NotificationCategory; 8] = [
        NotificationCategory::Announcements,
        NotificationCategory::Assignments,
        NotificationCategory::Grades,
        NotificationCategory::Attendance,
        NotificationCategory::Events,
        NotificationCategory::Messages,
        NotificationCategory::Reminders,
        NotificationCategory::Emergencies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Announcements => "announcements",
            NotificationCategory::Assignments => "assignments",
            NotificationCategory::Grades => "grades",
            NotificationCategory::Attendance => "attendance",
            NotificationCategory::Events => "events",
            NotificationCategory::Messages => "messages",
            NotificationCategory::Reminders => "reminders",
            NotificationCategory::Emergencies => "emergencies",
        }
    }

    /// Whether user preferences are bypassed for this category
    pub fn bypasses_preferences(&self) -> bool {
        matches!(self, NotificationCategory::Emergencies)
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown notification category: {}", s))
    }
}

/// Role filter for an audience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientRole {
    Parent,
    Teacher,
    Student,
    Admin,
}

impl RecipientRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientRole::Parent => "parent",
            RecipientRole::Teacher => "teacher",
            RecipientRole::Student => "student",
            RecipientRole::Admin => "admin",
        }
    }
}

impl fmt::Display for RecipientRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecipientRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parent" => Ok(RecipientRole::Parent),
            "teacher" => Ok(RecipientRole::Teacher),
            "student" => Ok(RecipientRole::Student),
            "admin" => Ok(RecipientRole::Admin),
            other => Err(format!("unknown recipient role: {}", other)),
        }
    }
}

/// Delivery priority passed through to the push gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Default,
    High,
}

/// The payload broadcast unchanged to every resolved token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchMessage {
    pub title: String,
    pub body: String,
    /// Opaque to the dispatcher, passed through to the device
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
    pub priority: Priority,
    pub sound: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<u32>,
}

impl DispatchMessage {
    /// Message with high priority and the platform default sound.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: serde_json::Map::new(),
            priority: Priority::High,
            sound: "default".to_string(),
            badge: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Map<String, serde_json::Value>) -> Self {
        self.data = data;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = sound.into();
        self
    }

    pub fn with_badge(mut self, badge: u32) -> Self {
        self.badge = Some(badge);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_str() {
        for category in NotificationCategory::ALL {
            assert_eq!(category.as_str().parse::<NotificationCategory>().unwrap(), category);
        }
        assert!("newsletters".parse::<NotificationCategory>().is_err());
    }

    #[test]
    fn test_only_emergencies_bypass_preferences() {
        let bypassing: Vec<_> = NotificationCategory::ALL
            .iter()
            .filter(|c| c.bypasses_preferences())
            .collect();
        assert_eq!(bypassing, vec![&NotificationCategory::Emergencies]);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&NotificationCategory::Announcements).unwrap(),
            "\"announcements\""
        );
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        assert_eq!(
            serde_json::from_str::<RecipientRole>("\"teacher\"").unwrap(),
            RecipientRole::Teacher
        );
    }
}
