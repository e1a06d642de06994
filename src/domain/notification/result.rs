use serde::{Deserialize, Serialize};

/// Where a delivery failure originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryErrorKind {
    /// A whole gateway call failed; every token of the batch counted as failed
    Transport,
    /// The gateway accepted the batch but rejected this token
    Rejected,
}

/// One structured failure entry in a [`DispatchResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryError {
    pub kind: DeliveryErrorKind,
    pub message: String,
    /// Provider detail, preserved verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Rejected token (rejections only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Number of tokens the entry accounts for (transport failures only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

impl DeliveryError {
    pub fn transport(message: impl Into<String>, batch_size: usize) -> Self {
        Self {
            kind: DeliveryErrorKind::Transport,
            message: message.into(),
            details: None,
            token: None,
            batch_size: Some(batch_size),
        }
    }

    pub fn rejected(
        token: impl Into<String>,
        message: Option<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            kind: DeliveryErrorKind::Rejected,
            message: message.unwrap_or_else(|| "Push ticket rejected".to_string()),
            details,
            token: Some(token.into()),
            batch_size: None,
        }
    }
}

/// Aggregate outcome of one dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    /// `failed == 0 || sent > 0`
    pub success: bool,
    pub sent: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<DeliveryError>>,
}

impl DispatchResult {
    /// Nothing needed to be sent.
    pub fn empty() -> Self {
        Self::from_tally(0, 0, Vec::new())
    }

    pub fn from_tally(sent: usize, failed: usize, errors: Vec<DeliveryError>) -> Self {
        Self {
            // Only a non-empty attempt with zero successes counts as unsuccessful
            success: failed == 0 || sent > 0,
            sent,
            failed,
            errors: if errors.is_empty() { None } else { Some(errors) },
        }
    }

    /// Number of tokens the dispatch accounted for.
    pub fn attempted(&self) -> usize {
        self.sent + self.failed
    }

    pub fn errors(&self) -> &[DeliveryError] {
        self.errors.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_success() {
        let result = DispatchResult::empty();
        assert!(result.success);
        assert_eq!(result.attempted(), 0);
        assert!(result.errors.is_none());
    }

    #[test]
    fn test_partial_failure_is_success() {
        let result = DispatchResult::from_tally(
            2,
            1,
            vec![DeliveryError::rejected("tok-3", Some("DeviceNotRegistered".into()), None)],
        );
        assert!(result.success);
        assert_eq!(result.errors().len(), 1);
    }

    #[test]
    fn test_total_failure_is_not_success() {
        let result = DispatchResult::from_tally(0, 5, vec![DeliveryError::transport("timeout", 5)]);
        assert!(!result.success);
        assert_eq!(result.attempted(), 5);
    }

    #[test]
    fn test_serialization_omits_empty_errors() {
        let json = serde_json::to_value(DispatchResult::from_tally(3, 0, Vec::new())).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "sent": 3, "failed": 0}));
    }

    #[test]
    fn test_rejected_without_message_gets_placeholder() {
        let err = DeliveryError::rejected("tok", None, None);
        assert_eq!(err.message, "Push ticket rejected");
        assert_eq!(err.kind, DeliveryErrorKind::Rejected);
    }
}
