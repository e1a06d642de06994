//! In-memory audience store using DashMap.
//!
//! Holds users, their device tokens and preferences in process memory.
//! Used by tests and by hosts running with `store_backend = "memory"`.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::notification::RecipientRole;

use super::store::{AudienceStore, StoreError};
use super::types::{DeviceToken, NotificationPreference, RecipientScope};

#[derive(Debug, Clone)]
struct UserRecord {
    school_id: String,
    role: RecipientRole,
}

#[derive(Default)]
pub struct MemoryAudienceStore {
    users: DashMap<String, UserRecord>,
    /// Tokens keyed by owning user
    tokens: DashMap<String, Vec<DeviceToken>>,
    preferences: DashMap<String, NotificationPreference>,
}

impl MemoryAudienceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user_id: impl Into<String>, school_id: impl Into<String>, role: RecipientRole) {
        self.users.insert(
            user_id.into(),
            UserRecord {
                school_id: school_id.into(),
                role,
            },
        );
    }

    pub fn add_token(&self, token: DeviceToken) {
        self.tokens.entry(token.user_id.clone()).or_default().push(token);
    }

    pub fn set_preference(&self, preference: NotificationPreference) {
        self.preferences.insert(preference.user_id.clone(), preference);
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl AudienceStore for MemoryAudienceStore {
    async fn candidate_tokens(&self, scope: &RecipientScope) -> Result<Vec<DeviceToken>, StoreError> {
        let allow_list = scope.recipient_filter();

        let mut user_ids: Vec<String> = self
            .users
            .iter()
            .filter(|entry| entry.school_id == scope.school_id)
            .filter(|entry| scope.role.map_or(true, |role| entry.role == role))
            .filter(|entry| allow_list.map_or(true, |ids| ids.contains(entry.key())))
            .map(|entry| entry.key().clone())
            .collect();
        // DashMap iteration order is arbitrary
        user_ids.sort();

        let mut candidates = Vec::new();
        for user_id in &user_ids {
            if let Some(tokens) = self.tokens.get(user_id) {
                candidates.extend(tokens.iter().filter(|t| t.is_active).cloned());
            }
        }

        Ok(candidates)
    }

    async fn preferences(
        &self,
        user_ids: &[String],
    ) -> Result<HashMap<String, NotificationPreference>, StoreError> {
        Ok(user_ids
            .iter()
            .filter_map(|id| self.preferences.get(id).map(|p| (id.clone(), p.clone())))
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audience::Platform;
    use crate::notification::NotificationCategory;

    fn seeded_store() -> MemoryAudienceStore {
        let store = MemoryAudienceStore::new();
        store.add_user("p1", "s1", RecipientRole::Parent);
        store.add_user("t1", "s1", RecipientRole::Teacher);
        store.add_user("p2", "s2", RecipientRole::Parent);
        store.add_token(DeviceToken::active("p1", Platform::Ios, "tok-p1"));
        store.add_token(DeviceToken::active("t1", Platform::Android, "tok-t1"));
        store.add_token(DeviceToken::active("p2", Platform::Android, "tok-p2"));
        store
    }

    fn tokens(list: Vec<DeviceToken>) -> Vec<String> {
        list.into_iter().map(|t| t.token).collect()
    }

    #[tokio::test]
    async fn test_school_scope() {
        let store = seeded_store();
        assert_eq!(store.user_count(), 3);
        let found = store.candidate_tokens(&RecipientScope::school("s1")).await.unwrap();
        assert_eq!(tokens(found), vec!["tok-p1", "tok-t1"]);
    }

    #[tokio::test]
    async fn test_role_scope() {
        let store = seeded_store();
        let scope = RecipientScope::school("s1").with_role(RecipientRole::Teacher);
        let found = store.candidate_tokens(&scope).await.unwrap();
        assert_eq!(tokens(found), vec!["tok-t1"]);
    }

    #[tokio::test]
    async fn test_recipient_outside_school_is_excluded() {
        let store = seeded_store();
        let scope = RecipientScope::school("s1").with_recipients(["p1", "p2"]);
        let found = store.candidate_tokens(&scope).await.unwrap();
        assert_eq!(tokens(found), vec!["tok-p1"]);
    }

    #[tokio::test]
    async fn test_inactive_tokens_are_skipped() {
        let store = seeded_store();
        store.add_token(DeviceToken {
            user_id: "p1".to_string(),
            platform: Platform::Android,
            token: "tok-p1-old".to_string(),
            is_active: false,
        });
        let scope = RecipientScope::school("s1").with_recipients(["p1"]);
        let found = store.candidate_tokens(&scope).await.unwrap();
        assert_eq!(tokens(found), vec!["tok-p1"]);
    }

    #[tokio::test]
    async fn test_preferences_only_for_known_users() {
        let store = seeded_store();
        store.set_preference(NotificationPreference::new("p1").set(NotificationCategory::Events, false));

        let prefs = store
            .preferences(&["p1".to_string(), "t1".to_string()])
            .await
            .unwrap();
        assert_eq!(prefs.len(), 1);
        assert!(!prefs["p1"].allows(NotificationCategory::Events));
    }
}
