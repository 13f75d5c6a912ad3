//! Webhook Lambda handler.
//!
//! Checks run in a fixed order, each assuming the previous ones passed:
//! - configuration (loaded once per process)
//! - `Linear-Signature` over the raw body
//! - HTTP method
//! - source IP allowlist (skipped in development mode)
//! - payload classification, formatting and dispatch

use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info, warn};

use super::{allowlist, helpers, parsing::InboundRequest, signature};
use crate::core::config::AppConfig;
use crate::core::http::build_http_client;
use crate::core::schema::{self, Classification, SchemaOptions};
use crate::discord::{DiscordWebhook, MessageSink, format_event};
use crate::errors::{ConfigError, RelayError};
use crate::linear::{IssueTracker, LinearClient};

pub use self::function_handler as handler;

/// What happened to an accepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Delivered,
    Skipped,
}

/// Long-lived state of the webhook function.
pub struct WebhookService<T, S> {
    config: AppConfig,
    tracker: T,
    sink: S,
}

impl WebhookService<LinearClient, DiscordWebhook> {
    #[must_use]
    pub fn from_config(config: AppConfig) -> Self {
        let http = build_http_client();
        let tracker = LinearClient::new(
            http.clone(),
            config.linear_api_url.clone(),
            config.linear_token.clone(),
        );
        let sink = DiscordWebhook::new(http, config.discord_webhook_url.clone());
        Self::new(config, tracker, sink)
    }
}

impl<T: IssueTracker, S: MessageSink> WebhookService<T, S> {
    pub fn new(config: AppConfig, tracker: T, sink: S) -> Self {
        Self {
            config,
            tracker,
            sink,
        }
    }

    #[must_use]
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs one API Gateway event through the pipeline and renders the
    /// proxy response.
    pub async fn handle_event(&self, payload: &Value) -> Value {
        let result = match InboundRequest::from_event(payload) {
            Ok(request) => self.process(&request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(Outcome::Delivered) => helpers::ok(),
            Ok(Outcome::Skipped) => helpers::skipped(),
            Err(e) => {
                error!(status = e.status_code(), "Error handling webhook: {}", e);
                helpers::error_response(&e)
            }
        }
    }

    /// # Errors
    ///
    /// Returns the first failed check, or a tracker/dispatch failure.
    pub async fn process(&self, request: &InboundRequest) -> Result<Outcome, RelayError> {
        let check = signature::check_signature(
            &request.signature,
            &request.body,
            Some(self.config.linear_secret.as_str()),
        );
        if !check.is_valid {
            let reason = check.error.unwrap_or_else(|| "Invalid signature".to_string());
            warn!("Invalid Linear signature: {}", reason);
            return Err(RelayError::Unauthorized(reason));
        }

        info!(forwarded_for = %request.forwarded_for, "Linear signature verified");

        if request.method != "POST" {
            warn!("Invalid HTTP method: {}", request.method);
            return Err(RelayError::MethodNotAllowed(format!(
                "Method {} is not allowed.",
                request.method
            )));
        }

        if !self.config.development_mode && !allowlist::is_trusted(&request.forwarded_for) {
            warn!("Unauthorized IP address: {}", request.forwarded_for);
            return Err(RelayError::Unauthorized(format!(
                "Request from IP address {} is not allowed.",
                request.forwarded_for
            )));
        }

        let Ok(value) = serde_json::from_slice::<Value>(&request.body) else {
            info!("Body is not JSON, skipping");
            return Ok(Outcome::Skipped);
        };

        let options = SchemaOptions {
            accept_comments: self.config.accept_comment_events,
        };
        let envelope = match schema::classify(&value, options) {
            Classification::Recognized(envelope) => envelope,
            Classification::Unrecognized { reason } => {
                info!(%reason, "Unsupported event type, skipping");
                return Ok(Outcome::Skipped);
            }
        };

        info!(
            resource = ?envelope.resource_type(),
            action = ?envelope.action(),
            "Processing event"
        );

        let Some(message) = format_event(&envelope, &self.tracker).await? else {
            info!("Nothing to report for this event, skipping");
            return Ok(Outcome::Skipped);
        };

        self.sink.dispatch(&message).await?;
        Ok(Outcome::Delivered)
    }
}

/// Lambda handler for the webhook entrypoint.
///
/// `service` is the per-process state, or the configuration error that
/// prevented building it; the latter answers every request with a 500.
///
/// # Errors
///
/// Never fails; every outcome is rendered as a proxy response.
#[tracing::instrument(level = "info", skip_all, fields(request_id = %event.context.request_id))]
pub async fn function_handler<T: IssueTracker, S: MessageSink>(
    service: Result<&WebhookService<T, S>, &ConfigError>,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    match service {
        Ok(service) => Ok(service.handle_event(&event.payload).await),
        Err(e) => {
            error!("Config error: {}", e);
            Ok(helpers::error_response(&RelayError::Config(e.clone())))
        }
    }
}
