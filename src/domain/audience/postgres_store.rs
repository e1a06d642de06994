//! PostgreSQL-backed audience store.
//!
//! Reads three tables:
//! - `users` (`id`, `school_id`, `role`)
//! - `push_tokens` (`user_id`, `token`, `platform`, `is_active`)
//! - `notification_preferences` (`user_id` plus one nullable boolean per category)
//!
//! Tokens and preferences are fetched in two separate queries so the
//! eligibility rule stays in the resolver rather than in SQL.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::notification::NotificationCategory;
use crate::postgres::PostgresPool;

use super::store::{AudienceStore, StoreError};
use super::types::{DeviceToken, NotificationPreference, RecipientScope};

type PreferenceRow = (
    String,
    Option<bool>,
    Option<bool>,
    Option<bool>,
    Option<bool>,
    Option<bool>,
    Option<bool>,
    Option<bool>,
    Option<bool>,
);

pub struct PostgresAudienceStore {
    pool: Arc<PostgresPool>,
}

impl PostgresAudienceStore {
    pub fn new(pool: Arc<PostgresPool>) -> Self {
        Self { pool }
    }
}

fn preference_from_row(row: PreferenceRow) -> NotificationPreference {
    let (user_id, announcements, assignments, grades, attendance, events, messages, reminders, emergencies) =
        row;
    let columns = [
        (NotificationCategory::Announcements, announcements),
        (NotificationCategory::Assignments, assignments),
        (NotificationCategory::Grades, grades),
        (NotificationCategory::Attendance, attendance),
        (NotificationCategory::Events, events),
        (NotificationCategory::Messages, messages),
        (NotificationCategory::Reminders, reminders),
        (NotificationCategory::Emergencies, emergencies),
    ];

    columns
        .into_iter()
        .fold(NotificationPreference::new(user_id), |pref, (category, value)| match value {
            Some(enabled) => pref.set(category, enabled),
            None => pref,
        })
}

#[async_trait]
impl AudienceStore for PostgresAudienceStore {
    async fn candidate_tokens(&self, scope: &RecipientScope) -> Result<Vec<DeviceToken>, StoreError> {
        let school_id = scope.school_id.clone();
        let role = scope.role.map(|r| r.as_str().to_string());
        let recipients = scope.recipient_filter().map(|ids| ids.to_vec());

        let rows: Vec<(String, String, String, bool)> = self
            .pool
            .execute(|pool| async move {
                sqlx::query_as(
                    r#"
                    SELECT pt.user_id::text, pt.token, pt.platform, pt.is_active
                    FROM push_tokens pt
                    JOIN users u ON u.id = pt.user_id
                    WHERE pt.is_active = TRUE
                      AND u.school_id::text = $1
                      AND ($2::text IS NULL OR u.role::text = $2)
                      AND ($3::text[] IS NULL OR pt.user_id::text = ANY($3))
                    ORDER BY pt.user_id, pt.token
                    "#,
                )
                .bind(school_id)
                .bind(role)
                .bind(recipients)
                .fetch_all(&pool)
                .await
            })
            .await?;

        let tokens = rows
            .into_iter()
            .filter_map(|(user_id, token, platform, is_active)| match platform.parse() {
                Ok(platform) => Some(DeviceToken {
                    user_id,
                    platform,
                    token,
                    is_active,
                }),
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "Skipping push token with unrecognized platform");
                    None
                }
            })
            .collect();

        Ok(tokens)
    }

    async fn preferences(
        &self,
        user_ids: &[String],
    ) -> Result<HashMap<String, NotificationPreference>, StoreError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids = user_ids.to_vec();

        let rows: Vec<PreferenceRow> = self
            .pool
            .execute(|pool| async move {
                sqlx::query_as(
                    r#"
                    SELECT user_id::text, announcements, assignments, grades, attendance,
                           events, messages, reminders, emergencies
                    FROM notification_preferences
                    WHERE user_id::text = ANY($1)
                    "#,
                )
                .bind(ids)
                .fetch_all(&pool)
                .await
            })
            .await?;

        Ok(rows
            .into_iter()
            .map(preference_from_row)
            .map(|pref| (pref.user_id.clone(), pref))
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_columns_stay_unset() {
        let pref = preference_from_row((
            "u1".to_string(),
            Some(false),
            None,
            Some(true),
            None,
            None,
            None,
            None,
            Some(false),
        ));

        assert_eq!(pref.flags.len(), 3);
        assert!(!pref.allows(NotificationCategory::Announcements));
        assert!(pref.allows(NotificationCategory::Assignments));
        assert!(pref.allows(NotificationCategory::Grades));
        // stored but never consulted
        assert!(pref.allows(NotificationCategory::Emergencies));
    }
}
