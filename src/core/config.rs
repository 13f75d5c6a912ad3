use std::env::{self, VarError};

use chrono_tz::Tz;
use url::Url;

use crate::errors::{ConfigError, ConfigIssue};

pub const DEFAULT_LINEAR_API_URL: &str = "https://api.linear.app/graphql";

const DISCORD_WEBHOOKS_URL: &str = "DISCORD_WEBHOOKS_URL";
const LINEAR_TOKEN: &str = "LINEAR_TOKEN";
const LINEAR_SECRET: &str = "LINEAR_SECRET";
const APP_ENV: &str = "APP_ENV";
const NODE_ENV: &str = "NODE_ENV";
const LINEAR_API_URL: &str = "LINEAR_API_URL";
const REPORT_TIMEZONE: &str = "REPORT_TIMEZONE";
const ACCEPT_COMMENT_EVENTS: &str = "ACCEPT_COMMENT_EVENTS";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub discord_webhook_url: String,
    pub linear_token: String,
    pub linear_secret: String,
    pub linear_api_url: String,
    /// Disables the source IP allowlist for local runs.
    pub development_mode: bool,
    pub report_timezone: Tz,
    pub accept_comment_events: bool,
}

impl AppConfig {
    /// Reads the process environment once.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming every missing or malformed key.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key))
    }

    /// Builds the config from an arbitrary key lookup.
    ///
    /// All keys are checked before returning so the error lists every problem,
    /// not just the first one hit.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming every missing or malformed key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let mut issues = Vec::new();

        let discord_webhook_url = required(&lookup, DISCORD_WEBHOOKS_URL, &mut issues);
        if let Some(raw) = &discord_webhook_url {
            if let Err(e) = Url::parse(raw) {
                issues.push(ConfigIssue::new(
                    DISCORD_WEBHOOKS_URL,
                    format!("Invalid url: {e}"),
                ));
            }
        }
        let linear_token = required(&lookup, LINEAR_TOKEN, &mut issues);
        let linear_secret = required(&lookup, LINEAR_SECRET, &mut issues);

        // Either key may name the environment; existing deployments set NODE_ENV.
        let app_env = optional(&lookup, APP_ENV, &mut issues);
        let node_env = optional(&lookup, NODE_ENV, &mut issues);
        let development_mode = [app_env, node_env]
            .iter()
            .flatten()
            .any(|v| v == "development");

        let linear_api_url = optional(&lookup, LINEAR_API_URL, &mut issues)
            .unwrap_or_else(|| DEFAULT_LINEAR_API_URL.to_string());
        if let Err(e) = Url::parse(&linear_api_url) {
            issues.push(ConfigIssue::new(LINEAR_API_URL, format!("Invalid url: {e}")));
        }

        let report_timezone = match optional(&lookup, REPORT_TIMEZONE, &mut issues) {
            None => Tz::UTC,
            Some(name) => name.parse::<Tz>().unwrap_or_else(|_| {
                issues.push(ConfigIssue::new(
                    REPORT_TIMEZONE,
                    format!("Unknown time zone '{name}'"),
                ));
                Tz::UTC
            }),
        };

        let accept_comment_events = match optional(&lookup, ACCEPT_COMMENT_EVENTS, &mut issues) {
            None => false,
            Some(v) => parse_flag(&v).unwrap_or_else(|| {
                issues.push(ConfigIssue::new(
                    ACCEPT_COMMENT_EVENTS,
                    format!("Expected a boolean, received '{v}'"),
                ));
                false
            }),
        };

        match (discord_webhook_url, linear_token, linear_secret) {
            (Some(discord_webhook_url), Some(linear_token), Some(linear_secret))
                if issues.is_empty() =>
            {
                Ok(Self {
                    discord_webhook_url,
                    linear_token,
                    linear_secret,
                    linear_api_url,
                    development_mode,
                    report_timezone,
                    accept_comment_events,
                })
            }
            _ => Err(ConfigError { issues }),
        }
    }
}

fn required<F>(lookup: &F, key: &str, issues: &mut Vec<ConfigIssue>) -> Option<String>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    match lookup(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        Ok(_) => {
            issues.push(ConfigIssue::new(key, "Required"));
            None
        }
        Err(VarError::NotPresent) => {
            issues.push(ConfigIssue::new(key, "Required"));
            None
        }
        Err(VarError::NotUnicode(_)) => {
            issues.push(ConfigIssue::new(key, "Expected string"));
            None
        }
    }
}

fn optional<F>(lookup: &F, key: &str, issues: &mut Vec<ConfigIssue>) -> Option<String>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    match lookup(key) {
        Ok(v) if v.trim().is_empty() => None,
        Ok(v) => Some(v),
        Err(VarError::NotPresent) => None,
        Err(VarError::NotUnicode(_)) => {
            issues.push(ConfigIssue::new(key, "Expected string"));
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
