//! All Discord-specific functionality

pub mod embed;
pub mod message_formatter;
pub mod webhook;

pub use embed::{ChatMessage, EmbedField};
pub use message_formatter::{format_event, parse_identifier};
pub use webhook::{DiscordWebhook, MessageSink};
