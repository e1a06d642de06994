use serde::{Deserialize, Serialize};

use crate::audience::RecipientScope;
use crate::notification::{DispatchMessage, NotificationCategory, Priority, RecipientRole};

use super::error::DispatchError;

/// Fallback message settings applied when a request leaves them unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDefaults {
    pub priority: Priority,
    pub sound: String,
}

impl Default for MessageDefaults {
    fn default() -> Self {
        Self {
            priority: Priority::High,
            sound: "default".to_string(),
        }
    }
}

/// One dispatch as requested by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    pub title: String,
    pub body: String,
    pub school_id: String,
    pub category: NotificationCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<RecipientRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<u32>,
}

impl PushRequest {
    pub fn builder(school_id: impl Into<String>, category: NotificationCategory) -> PushRequestBuilder {
        PushRequestBuilder::new(school_id, category)
    }

    /// Reject requests missing a title, body or school.
    pub fn validate(&self) -> Result<(), DispatchError> {
        let missing: Vec<&str> = [
            ("title", &self.title),
            ("body", &self.body),
            ("school_id", &self.school_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::InvalidRequest(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }

    pub fn scope(&self) -> RecipientScope {
        RecipientScope {
            school_id: self.school_id.clone(),
            role: self.role,
            recipient_ids: self.recipient_ids.clone(),
        }
    }

    pub fn message(&self, defaults: &MessageDefaults) -> DispatchMessage {
        let mut message = DispatchMessage::new(self.title.clone(), self.body.clone())
            .with_data(self.data.clone().unwrap_or_default())
            .with_priority(self.priority.unwrap_or(defaults.priority))
            .with_sound(self.sound.clone().unwrap_or_else(|| defaults.sound.clone()));
        message.badge = self.badge;
        message
    }
}

/// Builder for [`PushRequest`]
#[derive(Debug, Clone)]
pub struct PushRequestBuilder {
    request: PushRequest,
}

impl PushRequestBuilder {
    pub fn new(school_id: impl Into<String>, category: NotificationCategory) -> Self {
        Self {
            request: PushRequest {
                title: String::new(),
                body: String::new(),
                school_id: school_id.into(),
                category,
                role: None,
                recipient_ids: None,
                data: None,
                priority: None,
                sound: None,
                badge: None,
            },
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.request.title = title.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.request.body = body.into();
        self
    }

    pub fn role(mut self, role: RecipientRole) -> Self {
        self.request.role = Some(role);
        self
    }

    pub fn maybe_role(mut self, role: Option<RecipientRole>) -> Self {
        self.request.role = role;
        self
    }

    pub fn recipients<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.recipient_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.request.data = match data {
            serde_json::Value::Object(map) => Some(map),
            serde_json::Value::Null => None,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other);
                Some(map)
            }
        };
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.request.priority = Some(priority);
        self
    }

    pub fn sound(mut self, sound: impl Into<String>) -> Self {
        self.request.sound = Some(sound.into());
        self
    }

    pub fn badge(mut self, badge: u32) -> Self {
        self.request.badge = Some(badge);
        self
    }

    pub fn build(self) -> PushRequest {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let request = PushRequest::builder("s1", NotificationCategory::Grades)
            .title("New Grade Posted")
            .body("You received A in Math")
            .role(RecipientRole::Student)
            .recipients(["st-1"])
            .data(json!({"type": "grade", "subject": "Math"}))
            .badge(2)
            .build();

        assert!(request.validate().is_ok());
        assert_eq!(request.scope().recipient_ids, Some(vec!["st-1".to_string()]));
        assert_eq!(request.data.as_ref().unwrap()["type"], "grade");
    }

    #[test]
    fn test_validate_lists_missing_fields() {
        let request = PushRequest::builder(" ", NotificationCategory::Events)
            .title("Sports day")
            .build();

        match request.validate() {
            Err(DispatchError::InvalidRequest(msg)) => {
                assert!(msg.contains("body"));
                assert!(msg.contains("school_id"));
                assert!(!msg.contains("title"));
            }
            other => panic!("expected InvalidRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_message_applies_defaults() {
        let request = PushRequest::builder("s1", NotificationCategory::Messages)
            .title("Hi")
            .body("Hello")
            .build();
        let defaults = MessageDefaults {
            priority: Priority::Default,
            sound: "chime".to_string(),
        };

        let message = request.message(&defaults);
        assert_eq!(message.priority, Priority::Default);
        assert_eq!(message.sound, "chime");
        assert!(message.data.is_empty());

        let explicit = PushRequest::builder("s1", NotificationCategory::Messages)
            .title("Hi")
            .body("Hello")
            .priority(Priority::High)
            .sound("none")
            .badge(3)
            .build()
            .message(&defaults);
        assert_eq!(explicit.priority, Priority::High);
        assert_eq!(explicit.sound, "none");
        assert_eq!(explicit.badge, Some(3));
        assert_eq!(message.badge, None);
    }

    #[test]
    fn test_deserialize_caller_payload() {
        let request: PushRequest = serde_json::from_value(json!({
            "title": "Holiday",
            "body": "School closed",
            "school_id": "s1",
            "category": "announcements",
            "role": "parent"
        }))
        .unwrap();
        assert_eq!(request.role, Some(RecipientRole::Parent));
        assert!(request.recipient_ids.is_none());
    }
}
