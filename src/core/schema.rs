//! Typed view of Linear webhook payloads.
//!
//! Linear adds resource types and actions on its own schedule, so an unknown
//! shape is never an error here: [`classify`] answers
//! [`Classification::Unrecognized`] and the handler acknowledges the delivery
//! without doing anything. Answering non-2xx would make Linear retry it.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    Issue,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    pub creator_id: String,
    #[serde(default)]
    pub assignee: Option<IssueAssignee>,
    pub team: IssueTeam,
    pub state: IssueState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueAssignee {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueTeam {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueState {
    pub name: String,
    pub color: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentData {
    #[serde(default)]
    pub id: Option<String>,
    pub user_id: String,
    pub body: String,
    pub issue: CommentIssue,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentIssue {
    pub title: String,
}

/// Previous values of the fields touched by an update.
///
/// Only `stateId` drives behaviour; the rest is kept as delivered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedFrom {
    #[serde(default)]
    pub state_id: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Fields shared by every envelope, generic over the resource payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event<D> {
    pub action: Action,
    pub data: D,
    pub url: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_from: Option<UpdatedFrom>,
}

/// A webhook payload whose (type, action, data) combination is known.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Issue(Event<IssueData>),
    Comment(Event<CommentData>),
}

impl Envelope {
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Envelope::Issue(_) => ResourceType::Issue,
            Envelope::Comment(_) => ResourceType::Comment,
        }
    }

    #[must_use]
    pub fn action(&self) -> Action {
        match self {
            Envelope::Issue(e) => e.action,
            Envelope::Comment(e) => e.action,
        }
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Envelope::Issue(e) => e.created_at,
            Envelope::Comment(e) => e.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Recognized(Envelope),
    Unrecognized { reason: String },
}

impl Classification {
    fn unrecognized(reason: impl Into<String>) -> Self {
        Classification::Unrecognized {
            reason: reason.into(),
        }
    }
}

/// Which resource types the schema admits.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaOptions {
    pub accept_comments: bool,
}

/// Matches an untyped payload against the known envelope shapes.
///
/// Total: malformed or unknown input yields `Unrecognized`, never a panic.
#[must_use]
pub fn classify(value: &Value, options: SchemaOptions) -> Classification {
    let Some(type_name) = value.get("type").and_then(Value::as_str) else {
        return Classification::unrecognized("missing resource type");
    };

    let resource = match type_name {
        "Issue" => ResourceType::Issue,
        "Comment" if options.accept_comments => ResourceType::Comment,
        other => return Classification::unrecognized(format!("unsupported type '{other}'")),
    };

    match resource {
        ResourceType::Issue => serde_json::from_value::<Event<IssueData>>(value.clone())
            .map(|e| Classification::Recognized(Envelope::Issue(e))),
        ResourceType::Comment => serde_json::from_value::<Event<CommentData>>(value.clone())
            .map(|e| Classification::Recognized(Envelope::Comment(e))),
    }
    .unwrap_or_else(|e| Classification::unrecognized(format!("{type_name} payload: {e}")))
}

/// Accepts an RFC 3339 string or epoch milliseconds.
fn deserialize_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DateLike {
        Text(String),
        Millis(i64),
    }

    match DateLike::deserialize(deserializer)? {
        DateLike::Text(s) => DateTime::parse_from_rfc3339(&s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| de::Error::custom(format!("invalid date '{s}': {e}"))),
        DateLike::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {ms}"))),
    }
}
