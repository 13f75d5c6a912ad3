//! Linear GraphQL API client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::errors::RelayError;

const USER_QUERY: &str = r"
query User($id: String!) {
  user(id: $id) {
    id
    name
    displayName
    avatarUrl
    url
  }
}";

const ISSUES_UPDATED_SINCE_QUERY: &str = r"
query IssuesUpdatedSince($since: DateTimeOrDuration!, $after: String) {
  issues(first: 100, after: $after, filter: { updatedAt: { gte: $since } }) {
    nodes {
      id
      title
      createdAt
      updatedAt
      completedAt
      state {
        type
        name
      }
      assignee {
        id
        name
      }
    }
    pageInfo {
      hasNextPage
      endCursor
    }
  }
}";

/// Upper bound on pages fetched for a single report.
const MAX_ISSUE_PAGES: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowState {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueAssignee {
    pub id: String,
    pub name: String,
}

/// An issue as returned by the report query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub state: WorkflowState,
    #[serde(default)]
    pub assignee: Option<IssueAssignee>,
}

/// Read access to the issue tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// # Errors
    ///
    /// Returns [`RelayError::Tracker`] or [`RelayError::Http`] when the lookup fails.
    async fn user(&self, id: &str) -> Result<User, RelayError>;

    /// Every issue whose `updatedAt` is at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Tracker`] or [`RelayError::Http`] when the query fails.
    async fn issues_updated_since(&self, since: DateTime<Utc>) -> Result<Vec<Issue>, RelayError>;
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct UserData {
    user: User,
}

#[derive(Debug, Deserialize)]
struct IssuesData {
    issues: IssueConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueConnection {
    nodes: Vec<Issue>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    #[serde(default)]
    end_cursor: Option<String>,
}

pub struct LinearClient {
    http: HttpClient,
    api_url: String,
    token: String,
}

impl LinearClient {
    #[must_use]
    pub fn new(http: HttpClient, api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            token: token.into(),
        }
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, RelayError> {
        let resp = self
            .http
            .post(&self.api_url)
            .header(AUTHORIZATION, &self.token)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(RelayError::Tracker(format!(
                "HTTP error! status: {}",
                resp.status()
            )));
        }

        let body: GraphQlResponse<T> = resp
            .json()
            .await
            .map_err(|e| RelayError::Tracker(format!("JSON parse error: {e}")))?;

        if !body.errors.is_empty() {
            let messages: Vec<&str> = body.errors.iter().map(|e| e.message.as_str()).collect();
            error!("GraphQL errors: {:?}", messages);
            return Err(RelayError::Tracker(format!(
                "GraphQL query failed: {}",
                messages.join("; ")
            )));
        }

        body.data
            .ok_or_else(|| RelayError::Tracker("GraphQL response missing data".to_string()))
    }
}

#[async_trait]
impl IssueTracker for LinearClient {
    async fn user(&self, id: &str) -> Result<User, RelayError> {
        let data: UserData = self.query(USER_QUERY, json!({ "id": id })).await?;
        Ok(data.user)
    }

    async fn issues_updated_since(&self, since: DateTime<Utc>) -> Result<Vec<Issue>, RelayError> {
        let mut issues = Vec::new();
        let mut after: Option<String> = None;

        for _ in 0..MAX_ISSUE_PAGES {
            let data: IssuesData = self
                .query(
                    ISSUES_UPDATED_SINCE_QUERY,
                    json!({ "since": since.to_rfc3339(), "after": after.as_deref() }),
                )
                .await?;

            issues.extend(data.issues.nodes);
            match data.issues.page_info {
                PageInfo {
                    has_next_page: true,
                    end_cursor: Some(cursor),
                } => after = Some(cursor),
                _ => {
                    info!("Fetched {} issues updated since {}", issues.len(), since);
                    return Ok(issues);
                }
            }
        }

        Err(RelayError::Tracker(format!(
            "issue query exceeded {MAX_ISSUE_PAGES} pages"
        )))
    }
}
