//! Outbound reply delivery via the LINE reply API.
//!
//! Delivery is a collaborator behind the `ReplySender` trait so the dispatcher
//! never depends on the concrete transport. Without an access token the
//! gateway wires `LogOnlySender`, which records the synthesized reply instead
//! of delivering it.

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

const REPLY_API_URL: &str = "https://api.line.me/v2/bot/message/reply";

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("reply request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("reply api error: {0}")]
    Api(String),
}

/// Deliver a reply correlated to an inbound event by its reply token.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send(&self, reply_token: &str, text: &str) -> Result<(), DeliveryError>;
}

/// Production sender: POST to the reply API with the channel access token.
pub struct LineApiSender {
    access_token: String,
    api_url: String,
    client: reqwest::Client,
}

impl LineApiSender {
    pub fn new(access_token: String) -> Self {
        Self::with_api_url(access_token, REPLY_API_URL.to_string())
    }

    /// Construct against a non-default endpoint (tests, proxies).
    pub fn with_api_url(access_token: String, api_url: String) -> Self {
        Self {
            access_token,
            api_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ReplySender for LineApiSender {
    async fn send(&self, reply_token: &str, text: &str) -> Result<(), DeliveryError> {
        let body = json!({
            "replyToken": reply_token,
            "messages": [{ "type": "text", "text": text }],
        });
        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DeliveryError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }
}

/// Sender used when no access token is configured: logs the reply and succeeds.
pub struct LogOnlySender;

#[async_trait]
impl ReplySender for LogOnlySender {
    async fn send(&self, reply_token: &str, text: &str) -> Result<(), DeliveryError> {
        log::info!("reply (not delivered, no access token) token={} text={}", reply_token, text);
        Ok(())
    }
}
