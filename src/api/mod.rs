//! Webhook Lambda handler and request validation

pub mod allowlist;
pub mod handler;
pub mod helpers;
pub mod parsing;
pub mod signature;

// Re-export the main handler for convenience
pub use handler::{WebhookService, handler};
