use anyhow::Context as _;
use chrono::Utc;
use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Value, json};
use tracing::{error, info};

use super::daily::send_daily_report;
use crate::core::config::AppConfig;
use crate::core::http::build_http_client;
use crate::discord::{DiscordWebhook, MessageSink};
use crate::errors::ConfigError;
use crate::linear::{IssueTracker, LinearClient};

pub use self::function_handler as handler;

/// Runs one report against the configured services.
///
/// # Errors
///
/// Returns the underlying failure with context about the failed step.
pub async fn run_report(
    config: &AppConfig,
    tracker: &dyn IssueTracker,
    sink: &dyn MessageSink,
) -> anyhow::Result<()> {
    let report = send_daily_report(tracker, sink, config.report_timezone, Utc::now())
        .await
        .context("Failed to generate daily report")?;
    info!(users = report.user_reports.len(), "Daily report sent successfully");
    Ok(())
}

/// Lambda handler for the scheduled report.
///
/// Failures are logged and swallowed: the scheduler has nobody to report to.
///
/// # Errors
///
/// Never fails; the returned value records whether the report went out.
#[tracing::instrument(level = "info", skip_all, fields(request_id = %event.context.request_id))]
pub async fn function_handler(
    config: Result<&AppConfig, &ConfigError>,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    info!("Daily report triggered: {:?}", event.payload);

    let outcome = match config {
        Ok(config) => {
            let http = build_http_client();
            let tracker = LinearClient::new(
                http.clone(),
                config.linear_api_url.clone(),
                config.linear_token.clone(),
            );
            let sink = DiscordWebhook::new(http, config.discord_webhook_url.clone());
            run_report(config, &tracker, &sink).await
        }
        Err(e) => Err(anyhow::Error::new(e.clone())),
    };

    match outcome {
        Ok(()) => Ok(json!({ "sent": true })),
        Err(e) => {
            error!("Failed to send daily report: {:#}", e);
            Ok(json!({ "sent": false }))
        }
    }
}
