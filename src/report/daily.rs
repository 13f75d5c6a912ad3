//! Daily activity report: one aggregate message per scheduled run.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{info, warn};

use crate::discord::embed::MAX_DESCRIPTION_CHARS;
use crate::discord::{ChatMessage, MessageSink};
use crate::errors::RelayError;
use crate::linear::{Issue, IssueTracker};
use crate::utils::names::parse_linear_name;

/// Blue used for report embeds, `#0099FF`.
pub const REPORT_COLOR: u32 = 0x00_99_FF;
pub const UNASSIGNED: &str = "Unassigned";

const STATE_COMPLETED: &str = "completed";
const STATE_STARTED: &str = "started";
/// Room kept for the "…and N more" line and the closing fence.
const OMITTED_NOTE_RESERVE: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserReport {
    pub completed: u32,
    pub started: u32,
    pub created: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailyReport {
    pub overall: UserReport,
    pub user_reports: BTreeMap<String, UserReport>,
}

/// First instant of `now`'s calendar day in `tz`, plus that day.
#[must_use]
pub fn start_of_day(now: DateTime<Utc>, tz: Tz) -> (NaiveDate, DateTime<Utc>) {
    let today = now.with_timezone(&tz).date_naive();
    let midnight = today.and_hms_opt(0, 0, 0).unwrap_or_default();
    // Zones that skip midnight on DST days start the day at the first valid instant.
    let start = tz
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + chrono::Duration::hours(1))).earliest())
        .map_or_else(|| now, |d| d.with_timezone(&Utc));
    (today, start)
}

fn bucket_name(issue: &Issue) -> String {
    issue
        .assignee
        .as_ref()
        .map_or_else(|| UNASSIGNED.to_string(), |a| parse_linear_name(&a.name))
}

/// Counts created, completed and started issues since `start`.
#[must_use]
pub fn aggregate(issues: &[Issue], start: DateTime<Utc>) -> DailyReport {
    let mut report = DailyReport::default();

    for issue in issues {
        let created = issue.created_at >= start;
        let completed = issue.state.kind == STATE_COMPLETED
            && issue.completed_at.is_some_and(|at| at >= start);
        let started = issue.state.kind == STATE_STARTED && issue.updated_at >= start;

        let user = report.user_reports.entry(bucket_name(issue)).or_default();
        for counts in [&mut report.overall, user] {
            if created {
                counts.created += 1;
            }
            if completed {
                counts.completed += 1;
            }
            if started {
                counts.started += 1;
            }
        }
    }

    report
}

/// Renders `report` as a single embed with fixed-width blocks.
#[must_use]
pub fn create_daily_report_message(
    report: &DailyReport,
    day: NaiveDate,
    now: DateTime<Utc>,
) -> ChatMessage {
    let mut description = String::from("Summary of today's activities\n\n**Overall Statistics**\n```\n");
    let _ = writeln!(description, "✅ Completed: {}", report.overall.completed);
    let _ = writeln!(description, "🚀 Started: {}", report.overall.started);
    let _ = writeln!(description, "✨ Created: {}", report.overall.created);
    description.push_str("```\n**User Reports**\n```\n");

    if report.user_reports.is_empty() {
        description.push_str("No activity\n");
    }
    let mut used = description.chars().count();
    for (index, (name, counts)) in report.user_reports.iter().enumerate() {
        let mut block = String::new();
        let _ = writeln!(block, "{name}:");
        block.push_str("----------------\n");
        let _ = writeln!(block, "  Completed: {},", counts.completed);
        let _ = writeln!(block, "  Started: {},", counts.started);
        let _ = writeln!(block, "  Created: {}\n", counts.created);

        let len = block.chars().count();
        if used + len + OMITTED_NOTE_RESERVE > MAX_DESCRIPTION_CHARS {
            let omitted = report.user_reports.len() - index;
            warn!("Daily report omits {} users to fit the embed", omitted);
            let _ = writeln!(description, "…and {omitted} more");
            break;
        }
        used += len;
        description.push_str(&block);
    }
    description.push_str("```");

    ChatMessage::new(REPORT_COLOR, now)
        .title(format!("Daily Report {}", day.format("%Y-%m-%d")))
        .description(description)
}

/// Queries, aggregates, formats and dispatches the report for `now`'s day.
///
/// # Errors
///
/// Propagates tracker and dispatch failures.
pub async fn send_daily_report(
    tracker: &dyn IssueTracker,
    sink: &dyn MessageSink,
    tz: Tz,
    now: DateTime<Utc>,
) -> Result<DailyReport, RelayError> {
    let (day, start) = start_of_day(now, tz);
    info!(%day, %start, "Generating daily report");

    let issues = tracker.issues_updated_since(start).await?;
    if issues.is_empty() {
        warn!("No issues updated since {}", start);
    }

    let report = aggregate(&issues, start);
    let message = create_daily_report_message(&report, day, now);
    sink.dispatch(&message).await?;

    info!(
        completed = report.overall.completed,
        started = report.overall.started,
        created = report.overall.created,
        "Daily report sent"
    );
    Ok(report)
}
