//! Operator endpoint tests driven through the router without a socket.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use campus_push_dispatch::audience::{DeviceToken, MemoryAudienceStore, Platform};
use campus_push_dispatch::config::Settings;
use campus_push_dispatch::dispatch::{NotificationDispatcher, PushRequest};
use campus_push_dispatch::gateway::{GatewayError, PushGateway, PushMessage, PushTicket};
use campus_push_dispatch::notification::{NotificationCategory, RecipientRole};
use campus_push_dispatch::queue::MemoryJobStore;
use campus_push_dispatch::server::{create_app, AppState};

struct AcceptAll;

#[async_trait]
impl PushGateway for AcceptAll {
    async fn send_batch(&self, messages: &[PushMessage]) -> Result<Vec<PushTicket>, GatewayError> {
        Ok(messages.iter().map(|_| PushTicket::ok("ticket")).collect())
    }

    fn name(&self) -> &'static str {
        "accept-all"
    }
}

fn setup() -> (Router, Arc<NotificationDispatcher>) {
    let store = MemoryAudienceStore::new();
    store.add_user("p1", "S1", RecipientRole::Parent);
    store.add_token(DeviceToken::active("p1", Platform::Ios, "ExponentPushToken[p1]"));

    let settings = Settings::default();
    let dispatcher = Arc::new(NotificationDispatcher::from_settings(
        &settings,
        Arc::new(store),
        Arc::new(AcceptAll),
        Arc::new(MemoryJobStore::new()),
    ));

    let app = create_app(AppState::new(settings, dispatcher.clone(), None));
    (app, dispatcher)
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_health_reports_backends() {
    let (app, _) = setup();

    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["dispatch"]["audience_backend"], "memory");
    assert_eq!(json["dispatch"]["queue_backend"], "memory");
    assert_eq!(json["dispatch"]["gateway"], "accept-all");
    assert_eq!(json["dispatch"]["batch_size"], 100);
    assert!(json.get("postgres").is_none());
}

#[tokio::test]
async fn test_stats_reflect_dispatches() {
    let (app, dispatcher) = setup();

    let request = PushRequest::builder("S1", NotificationCategory::Announcements)
        .title("Holiday")
        .body("School closed Friday")
        .role(RecipientRole::Parent)
        .build();
    let result = dispatcher.send_now(request).await.unwrap();
    assert_eq!(result.sent, 1);

    let (status, body) = get(app, "/stats").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["dispatch"]["immediate_dispatches"], 1);
    assert_eq!(json["dispatch"]["tokens_sent"], 1);
    assert_eq!(json["dispatch"]["tokens_failed"], 0);
    assert!(json.get("database").is_none());
}

#[tokio::test]
async fn test_metrics_exposition() {
    let (app, _) = setup();

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.contains("database_circuit_breaker_state"));
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _) = setup();
    let (status, _) = get(app, "/notifications/send").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
