//! Scheduled daily report Lambda

pub mod daily;
pub mod handler;

pub use daily::{DailyReport, UserReport, aggregate, send_daily_report};
pub use handler::handler;
