//! Linear API access

pub mod client;

pub use client::{Issue, IssueAssignee, IssueTracker, LinearClient, User, WorkflowState};
