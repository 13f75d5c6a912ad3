//! linear-relay - forwards Linear webhooks to a Discord channel.
//!
//! This crate implements two AWS Lambda functions:
//! 1. A webhook function that verifies Linear's signature and source address,
//!    classifies the payload and posts a Discord embed for supported events
//! 2. A scheduled function that posts a daily summary of issue activity
//!
//! # Architecture
//!
//! The system uses:
//! - AWS Lambda (behind API Gateway / `EventBridge`) for serverless execution
//! - Linear's GraphQL API for user lookups and the report query
//! - a Discord incoming webhook as the only output
//! - Tokio for async runtime
//!
//! # Example
//!
//! ```no_run
//! use linear_relay::api::WebhookService;
//! use linear_relay::core::config::AppConfig;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     linear_relay::setup_logging();
//!
//!     let config = AppConfig::from_env()?;
//!     let service = WebhookService::from_config(config);
//!
//!     let response = service
//!         .handle_event(&json!({
//!             "httpMethod": "POST",
//!             "headers": { "Linear-Signature": "…", "X-Forwarded-For": "35.231.147.226" },
//!             "body": "{\"type\":\"Issue\",\"action\":\"create\"}"
//!         }))
//!         .await;
//!     println!("{response}");
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod core;
pub mod discord;
pub mod errors;
pub mod linear;
pub mod report;
pub mod utils;

pub use errors::{ConfigError, RelayError};

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration, filtered by `RUST_LOG` (default `info`). It
/// should be called once at the start of each Lambda binary; later calls are
/// no-ops.
///
/// # Example
///
/// ```
/// // Initialize structured logging at the start of your Lambda handler
/// linear_relay::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
