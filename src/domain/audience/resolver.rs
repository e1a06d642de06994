//! Audience resolution: scope + category -> deduplicated device tokens.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;

use crate::notification::NotificationCategory;

use super::store::{AudienceStore, StoreError};
use super::types::{DeviceToken, NotificationPreference, RecipientScope};

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("Audience lookup failed: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of a best-effort resolution.
///
/// A failed lookup yields an empty token list; the failure is kept so
/// callers can record it without treating it as fatal.
#[derive(Debug)]
pub struct Resolution {
    pub tokens: Vec<String>,
    pub failure: Option<ResolutionError>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Eligibility of one user for one category.
///
/// Emergencies always pass. Otherwise a missing record or a missing flag
/// means enabled and only an explicit `false` excludes.
pub fn is_eligible(category: NotificationCategory, preference: Option<&NotificationPreference>) -> bool {
    if category.bypasses_preferences() {
        return true;
    }
    preference.map_or(true, |p| p.allows(category))
}

pub struct AudienceResolver {
    store: Arc<dyn AudienceStore>,
}

impl AudienceResolver {
    pub fn new(store: Arc<dyn AudienceStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn AudienceStore> {
        &self.store
    }

    /// Resolve the active, opted-in device tokens for `scope`.
    ///
    /// The result has no duplicates and may be empty. Any store failure
    /// fails the whole resolution; partial results are never returned.
    #[tracing::instrument(
        name = "audience.resolve",
        skip(self, scope),
        fields(school_id = %scope.school_id, category = %category)
    )]
    pub async fn resolve_tokens(
        &self,
        scope: &RecipientScope,
        category: NotificationCategory,
    ) -> Result<Vec<String>, ResolutionError> {
        if scope.school_id.trim().is_empty() {
            return Err(ResolutionError::InvalidScope("school_id is required".to_string()));
        }

        let allow_list: Option<HashSet<&str>> = scope
            .recipient_filter()
            .map(|ids| ids.iter().map(String::as_str).collect());

        // Re-check what the store was asked to filter so a lax backend cannot widen the audience
        let candidates: Vec<DeviceToken> = self
            .store
            .candidate_tokens(scope)
            .await?
            .into_iter()
            .filter(|t| t.is_active)
            .filter(|t| allow_list.as_ref().map_or(true, |ids| ids.contains(t.user_id.as_str())))
            .collect();

        if candidates.is_empty() {
            tracing::debug!("No push tokens found for scope");
            return Ok(Vec::new());
        }

        let preferences = if category.bypasses_preferences() {
            HashMap::new()
        } else {
            let mut user_ids: Vec<String> = candidates.iter().map(|t| t.user_id.clone()).collect();
            user_ids.sort();
            user_ids.dedup();
            self.store.preferences(&user_ids).await?
        };

        let mut seen = HashSet::new();
        let mut tokens = Vec::new();
        let mut opted_out = 0usize;

        for candidate in candidates {
            if !is_eligible(category, preferences.get(&candidate.user_id)) {
                opted_out += 1;
                continue;
            }
            if seen.insert(candidate.token.clone()) {
                tokens.push(candidate.token);
            }
        }

        tracing::debug!(
            token_count = tokens.len(),
            opted_out = opted_out,
            "Resolved audience"
        );

        Ok(tokens)
    }

    /// Resolve without failing the caller.
    ///
    /// Notification delivery never blocks the business action that
    /// triggered it, so a lookup failure is logged and resolves to nobody.
    pub async fn resolve_best_effort(
        &self,
        scope: &RecipientScope,
        category: NotificationCategory,
    ) -> Resolution {
        match self.resolve_tokens(scope, category).await {
            Ok(tokens) => Resolution { tokens, failure: None },
            Err(e) => {
                tracing::error!(
                    school_id = %scope.school_id,
                    category = %category,
                    backend = self.store.backend_name(),
                    error = %e,
                    "Audience resolution failed, treating as empty audience"
                );
                Resolution {
                    tokens: Vec::new(),
                    failure: Some(e),
                }
            }
        }
    }
}
