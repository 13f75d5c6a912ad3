//! Delivery of formatted messages to a Discord incoming webhook.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Serialize;
use tracing::{error, info};

use super::embed::ChatMessage;
use crate::errors::RelayError;

pub const WEBHOOK_USERNAME: &str = "Linear";
pub const WEBHOOK_AVATAR_URL: &str = "https://ldw.screfy.com/static/linear.png";

/// Destination for formatted messages. One call sends exactly one message.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// # Errors
    ///
    /// Returns [`RelayError::Dispatch`] or [`RelayError::Http`] when delivery fails.
    async fn dispatch(&self, message: &ChatMessage) -> Result<(), RelayError>;
}

#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub username: &'a str,
    pub avatar_url: &'a str,
    pub embeds: [&'a ChatMessage; 1],
}

impl<'a> WebhookPayload<'a> {
    #[must_use]
    pub fn new(message: &'a ChatMessage) -> Self {
        Self {
            username: WEBHOOK_USERNAME,
            avatar_url: WEBHOOK_AVATAR_URL,
            embeds: [message],
        }
    }
}

pub struct DiscordWebhook {
    http: HttpClient,
    url: String,
}

impl DiscordWebhook {
    #[must_use]
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl MessageSink for DiscordWebhook {
    async fn dispatch(&self, message: &ChatMessage) -> Result<(), RelayError> {
        let message = message.within_total_limit();
        let resp = self
            .http
            .post(&self.url)
            .json(&WebhookPayload::new(&message))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            error!("Discord webhook POST failed: status={} body={}", status, body_text);
            return Err(RelayError::Dispatch(format!("HTTP error! status: {status}")));
        }

        info!("Discord webhook sent successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> ChatMessage {
        ChatMessage::new(0x5E6AD2, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
            .title("ENG-1 Hello")
    }

    #[tokio::test]
    async fn posts_single_embed_with_fixed_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/webhooks/1/token"))
            .and(body_json(json!({
                "username": "Linear",
                "avatar_url": "https://ldw.screfy.com/static/linear.png",
                "embeds": [{
                    "title": "ENG-1 Hello",
                    "color": 0x5E6AD2,
                    "timestamp": "2024-03-01T00:00:00.000Z",
                    "fields": []
                }]
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let sink = DiscordWebhook::new(
            HttpClient::new(),
            format!("{}/api/webhooks/1/token", server.uri()),
        );
        sink.dispatch(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_a_dispatch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .expect(1)
            .mount(&server)
            .await;

        let sink = DiscordWebhook::new(HttpClient::new(), server.uri());
        let err = sink.dispatch(&message()).await.unwrap_err();
        assert!(matches!(err, RelayError::Dispatch(_)));
        assert_eq!(err.status_code(), 500);
    }
}
