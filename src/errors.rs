use serde::Serialize;
use thiserror::Error;

/// One offending configuration key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigIssue {
    pub path: Vec<String>,
    pub message: String,
}

impl ConfigIssue {
    #[must_use]
    pub fn new(key: &str, message: impl Into<String>) -> Self {
        Self {
            path: vec![key.to_string()],
            message: message.into(),
        }
    }
}

/// Every missing or malformed key found while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid configuration: {}", summarize(.issues))]
pub struct ConfigError {
    pub issues: Vec<ConfigIssue>,
}

fn summarize(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{} ({})", issue.path.join("."), issue.message))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("Invalid payload: {0}")]
    Validation(String),

    #[error("Failed to query Linear API: {0}")]
    Tracker(String),

    #[error("Failed to dispatch Discord webhook: {0}")]
    Dispatch(String),

    #[error("Failed to send HTTP request: {0}")]
    Http(#[from] reqwest::Error),
}

impl RelayError {
    /// HTTP status reported to the caller of the webhook endpoint.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::Unauthorized(_) => 403,
            RelayError::MethodNotAllowed(_) => 405,
            RelayError::Validation(_) => 400,
            RelayError::Config(_)
            | RelayError::Tracker(_)
            | RelayError::Dispatch(_)
            | RelayError::Http(_) => 500,
        }
    }
}
