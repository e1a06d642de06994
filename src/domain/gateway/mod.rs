//! Push gateway abstraction.
//!
//! A gateway accepts one batch of messages per call and answers with one
//! ticket per message, in submission order. `ExpoPushGateway` is the HTTP
//! implementation used in production; tests plug in scripted gateways.

mod expo;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notification::{DispatchMessage, Priority};

pub use expo::ExpoPushGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network, DNS or connection failure
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gateway call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Gateway returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed gateway response: {0}")]
    MalformedResponse(String),

    #[error("Gateway returned {actual} tickets for {expected} messages")]
    TicketCountMismatch { expected: usize, actual: usize },
}

/// One message object of a gateway batch. Only `to` differs between the
/// messages of a dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Map<String, serde_json::Value>,
    pub sound: String,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<u32>,
    #[serde(rename = "channelId")]
    pub channel_id: String,
}

impl PushMessage {
    pub fn for_token(token: impl Into<String>, message: &DispatchMessage, channel_id: &str) -> Self {
        Self {
            to: token.into(),
            title: message.title.clone(),
            body: message.body.clone(),
            data: message.data.clone(),
            sound: message.sound.clone(),
            priority: message.priority,
            badge: message.badge,
            channel_id: channel_id.to_string(),
        }
    }
}

/// Per-message result returned by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushTicket {
    /// `"ok"` or `"error"`
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl PushTicket {
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            id: Some(id.into()),
            message: None,
            details: None,
        }
    }

    pub fn error(message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            status: "error".to_string(),
            id: None,
            message: Some(message.into()),
            details,
        }
    }

    /// Parse one raw ticket. An entry that does not parse becomes an error
    /// ticket for its own message only, carrying the raw JSON as details.
    pub fn from_value(raw: serde_json::Value) -> Self {
        match serde_json::from_value::<PushTicket>(raw.clone()) {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::debug!(error = %e, "Unparseable push ticket");
                Self::error("Malformed ticket", Some(raw))
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Send one batch. On success the tickets line up with `messages`.
    async fn send_batch(&self, messages: &[PushMessage]) -> Result<Vec<PushTicket>, GatewayError>;

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_wire_shape() {
        let message = DispatchMessage::new("Holiday", "School closed Friday");
        let push = PushMessage::for_token("ExponentPushToken[abc]", &message, "default");

        let value = serde_json::to_value(&push).unwrap();
        assert_eq!(value["to"], "ExponentPushToken[abc]");
        assert_eq!(value["channelId"], "default");
        assert_eq!(value["priority"], "high");
        assert!(value.get("badge").is_none());
    }

    #[test]
    fn test_ticket_parsing() {
        let tickets: Vec<PushTicket> = serde_json::from_value(json!([
            {"status": "ok", "id": "XXXX-1"},
            {"status": "error", "message": "not registered", "details": {"error": "DeviceNotRegistered"}}
        ]))
        .unwrap();

        assert!(tickets[0].is_ok());
        assert!(!tickets[1].is_ok());
        assert_eq!(tickets[1].details, Some(json!({"error": "DeviceNotRegistered"})));
    }

    #[test]
    fn test_malformed_ticket_is_isolated() {
        let ok = PushTicket::from_value(json!({"status": "ok", "id": "XXXX-1"}));
        assert!(ok.is_ok());
        assert_eq!(ok.id.as_deref(), Some("XXXX-1"));

        let missing_status = PushTicket::from_value(json!({"message": "unknown"}));
        assert!(!missing_status.is_ok());
        assert_eq!(missing_status.message.as_deref(), Some("Malformed ticket"));
        assert_eq!(missing_status.details, Some(json!({"message": "unknown"})));

        let not_an_object = PushTicket::from_value(json!(42));
        assert!(!not_an_object.is_ok());
        assert_eq!(not_an_object.details, Some(json!(42)));
    }
}
