//! Expo push service client.
//!
//! POSTs a JSON array of messages to the batch endpoint and parses
//! `{"data": [ticket, ...]}`. A body without a `data` array is a malformed
//! response; a single bad entry inside the array only fails its own ticket.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Deserialize;

use crate::config::GatewayConfig;

use super::{GatewayError, PushGateway, PushMessage, PushTicket};

/// Longest error body (in chars) kept in `GatewayError::HttpStatus`
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Deserialize)]
struct ExpoResponse {
    #[serde(default)]
    data: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

pub struct ExpoPushGateway {
    client: reqwest::Client,
    url: String,
    access_token: Option<String>,
    timeout: Duration,
}

impl ExpoPushGateway {
    /// Accept-Encoding (`gzip, deflate`) is negotiated by reqwest, which
    /// also decodes compressed ticket responses.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PushGateway for ExpoPushGateway {
    async fn send_batch(&self, messages: &[PushMessage]) -> Result<Vec<PushTicket>, GatewayError> {
        let mut request = self.client.post(&self.url).json(messages);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(self.timeout)
            } else {
                GatewayError::Request(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body: String = text.chars().take(MAX_ERROR_BODY).collect();
            return Err(GatewayError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let parsed: ExpoResponse = serde_json::from_slice(&bytes)
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        match parsed.data {
            Some(raw) => Ok(raw.into_iter().map(PushTicket::from_value).collect()),
            None => {
                let detail = parsed
                    .errors
                    .map(|errors| format!("No data in response: {}", errors))
                    .unwrap_or_else(|| "No data in response".to_string());
                Err(GatewayError::MalformedResponse(detail))
            }
        }
    }

    fn name(&self) -> &'static str {
        "expo"
    }
}
