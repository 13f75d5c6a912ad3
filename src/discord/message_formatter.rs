//! Turns a classified Linear webhook into a Discord embed.

use tracing::{info, warn};

use super::embed::{ChatMessage, LINEAR_COLOR, parse_hex_color};
use crate::core::schema::{Action, CommentData, Envelope, Event, IssueData};
use crate::errors::RelayError;
use crate::linear::{IssueTracker, User};

pub const LINEAR_BASE_URL: &str = "https://linear.app";

/// Issue identifier (`ENG-42`) taken from a Linear issue or comment URL.
///
/// # Errors
///
/// Returns [`RelayError::Validation`] when the URL has no sixth segment.
pub fn parse_identifier(url: &str) -> Result<&str, RelayError> {
    url.split('/')
        .nth(5)
        .map(|segment| segment.split('#').next().unwrap_or(segment))
        .filter(|identifier| !identifier.is_empty())
        .ok_or_else(|| RelayError::Validation(format!("no issue identifier in url '{url}'")))
}

/// Builds the message for `envelope`, or `None` when the event has nothing
/// worth posting (e.g. an update that did not change the workflow state).
///
/// Only user lookups go to the tracker.
///
/// # Errors
///
/// Propagates tracker failures and malformed issue URLs.
pub async fn format_event(
    envelope: &Envelope,
    tracker: &dyn IssueTracker,
) -> Result<Option<ChatMessage>, RelayError> {
    match envelope {
        Envelope::Issue(event) => match event.action {
            Action::Create => issue_created(event, tracker).await.map(Some),
            Action::Update if has_state_change(event) => {
                issue_state_changed(event, tracker).await.map(Some)
            }
            Action::Update | Action::Remove => Ok(None),
        },
        Envelope::Comment(event) => match event.action {
            Action::Create => comment_created(event, tracker).await.map(Some),
            Action::Update | Action::Remove => Ok(None),
        },
    }
}

fn has_state_change(event: &Event<IssueData>) -> bool {
    event
        .updated_from
        .as_ref()
        .and_then(|from| from.state_id.as_deref())
        .is_some_and(|id| !id.is_empty())
}

fn base_message<D>(event: &Event<D>) -> ChatMessage {
    ChatMessage::new(LINEAR_COLOR, event.created_at)
}

fn with_footer(message: ChatMessage, user: &User) -> ChatMessage {
    message.footer(user.name.clone(), user.avatar_url.clone())
}

async fn issue_created(
    event: &Event<IssueData>,
    tracker: &dyn IssueTracker,
) -> Result<ChatMessage, RelayError> {
    info!("Processing new issue creation");
    let identifier = parse_identifier(&event.url)?;
    let data = &event.data;

    let assignee_lookup = async {
        match &data.assignee {
            Some(assignee) => tracker.user(&assignee.id).await.map(Some),
            None => Ok(None),
        }
    };
    let (creator, assignee) = futures::try_join!(tracker.user(&data.creator_id), assignee_lookup)?;

    let team_url = format!("{LINEAR_BASE_URL}/team/{}", data.team.key);
    let mut message = with_footer(base_message(event), &creator)
        .title(format!("{identifier} {}", data.title))
        .url(event.url.clone())
        .author("New issue added")
        .field("Team", format!("[{}]({team_url})", data.team.name), true)
        .field("Status", data.state.name.clone(), true);

    if let Some(assignee) = assignee {
        info!("Issue assigned to: {}", assignee.name);
        message = message.field(
            "Assignee",
            format!("[{}]({})", assignee.display_name, assignee.url),
            true,
        );
    }

    if let Some(description) = data.description.as_deref().filter(|d| !d.is_empty()) {
        message = message.description(description);
    }

    Ok(message)
}

async fn issue_state_changed(
    event: &Event<IssueData>,
    tracker: &dyn IssueTracker,
) -> Result<ChatMessage, RelayError> {
    info!("Processing issue status update");
    let identifier = parse_identifier(&event.url)?;
    let data = &event.data;
    let creator = tracker.user(&data.creator_id).await?;

    let mut message = with_footer(base_message(event), &creator)
        .title(format!("{identifier} {}", data.title))
        .url(event.url.clone())
        .author("Status changed")
        .description(format!("Status: **{}**", data.state.name));

    match parse_hex_color(&data.state.color) {
        Some(color) => message = message.color(color),
        None => warn!("Ignoring unparseable state color '{}'", data.state.color),
    }

    Ok(message)
}

async fn comment_created(
    event: &Event<CommentData>,
    tracker: &dyn IssueTracker,
) -> Result<ChatMessage, RelayError> {
    info!("Processing new comment creation");
    let identifier = parse_identifier(&event.url)?;
    let data = &event.data;
    let user = tracker.user(&data.user_id).await?;

    Ok(with_footer(base_message(event), &user)
        .title(format!("{identifier} {}", data.issue.title))
        .url(event.url.clone())
        .author("New comment")
        .description(data.body.clone()))
}
