#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use linear_relay::core::config::AppConfig;
use linear_relay::discord::{ChatMessage, MessageSink};
use linear_relay::errors::RelayError;
use linear_relay::linear::{Issue, IssueTracker, User};
use serde_json::{Value, json};

pub const SECRET: &str = "webhook-secret";
pub const TRUSTED_IP: &str = "35.231.147.226";

pub fn config() -> AppConfig {
    AppConfig {
        discord_webhook_url: "https://discord.test/api/webhooks/1/token".to_string(),
        linear_token: "lin_api_token".to_string(),
        linear_secret: SECRET.to_string(),
        linear_api_url: "https://linear.test/graphql".to_string(),
        development_mode: false,
        report_timezone: chrono_tz::Tz::UTC,
        accept_comment_events: false,
    }
}

pub fn user(id: &str, name: &str, display_name: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        display_name: display_name.to_string(),
        avatar_url: Some(format!("https://avatars.test/{id}.png")),
        url: format!("https://linear.app/acme/profiles/{display_name}"),
    }
}

/// In-memory tracker that records every lookup.
#[derive(Default)]
pub struct FakeTracker {
    pub users: HashMap<String, User>,
    pub issues: Vec<Issue>,
    pub fail: bool,
    pub user_lookups: Mutex<Vec<String>>,
    pub issue_queries: Mutex<Vec<DateTime<Utc>>>,
}

impl FakeTracker {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        let mut lookups = self.user_lookups.lock().unwrap().clone();
        lookups.sort();
        lookups
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn user(&self, id: &str) -> Result<User, RelayError> {
        self.user_lookups.lock().unwrap().push(id.to_string());
        if self.fail {
            return Err(RelayError::Tracker("HTTP error! status: 500".to_string()));
        }
        self.users
            .get(id)
            .cloned()
            .ok_or_else(|| RelayError::Tracker(format!("Entity not found: {id}")))
    }

    async fn issues_updated_since(&self, since: DateTime<Utc>) -> Result<Vec<Issue>, RelayError> {
        self.issue_queries.lock().unwrap().push(since);
        if self.fail {
            return Err(RelayError::Tracker("HTTP error! status: 500".to_string()));
        }
        Ok(self.issues.clone())
    }
}

/// Sink that keeps dispatched messages instead of posting them.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<ChatMessage>>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn dispatch(&self, message: &ChatMessage) -> Result<(), RelayError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            return Err(RelayError::Dispatch("HTTP error! status: 500".to_string()));
        }
        Ok(())
    }
}

pub fn issue_create_payload(with_assignee: bool) -> Value {
    let mut payload = json!({
        "type": "Issue",
        "action": "create",
        "url": "https://linear.app/acme/issue/ENG-42/fix-login#new",
        "createdAt": "2024-03-01T10:15:30.000Z",
        "webhookId": "wh-1",
        "data": {
            "id": "issue-1",
            "title": "Fix login",
            "description": "Login fails on Safari",
            "url": "https://linear.app/acme/issue/ENG-42/fix-login",
            "creatorId": "user-creator",
            "team": { "key": "ENG", "name": "Engineering" },
            "state": { "name": "Todo", "color": "#e2e2e2", "type": "unstarted" }
        }
    });
    if with_assignee {
        payload["data"]["assignee"] = json!({ "id": "user-assignee", "name": "john.doe@x.com" });
    }
    payload
}

pub fn issue_state_update_payload() -> Value {
    let mut payload = issue_create_payload(false);
    payload["action"] = json!("update");
    payload["data"]["state"] = json!({ "name": "In Progress", "color": "#f2c94c", "type": "started" });
    payload["updatedFrom"] = json!({ "stateId": "state-todo", "updatedAt": "2024-03-01T09:00:00.000Z" });
    payload
}

pub fn comment_create_payload() -> Value {
    json!({
        "type": "Comment",
        "action": "create",
        "url": "https://linear.app/acme/issue/ENG-42/fix-login#comment-7f3a",
        "createdAt": "2024-03-01T11:00:00.000Z",
        "data": {
            "id": "comment-1",
            "userId": "user-commenter",
            "body": "Reproduced on 17.2",
            "issue": { "title": "Fix login" }
        }
    })
}
