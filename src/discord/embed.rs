//! Discord embed payload.

use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;

/// Linear brand purple, `#5E6AD2`.
pub const LINEAR_COLOR: u32 = 0x5E_6A_D2;

// Discord rejects embeds over these limits, counted in characters.
pub const MAX_TITLE_CHARS: usize = 256;
pub const MAX_DESCRIPTION_CHARS: usize = 4096;
pub const MAX_AUTHOR_CHARS: usize = 256;
pub const MAX_FOOTER_CHARS: usize = 2048;
pub const MAX_FIELD_NAME_CHARS: usize = 256;
pub const MAX_FIELD_VALUE_CHARS: usize = 1024;
pub const MAX_FIELDS: usize = 25;
pub const MAX_EMBED_CHARS: usize = 6000;

const ELLIPSIS: char = '…';

/// Cuts `text` to at most `max` characters, marking the cut with an ellipsis.
#[must_use]
pub fn truncate_chars(text: String, max: usize) -> String {
    if text.chars().count() <= max {
        return text;
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push(ELLIPSIS);
    out
}

fn char_len(text: Option<&str>) -> usize {
    text.map_or(0, |t| t.chars().count())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// One chat message, built up field by field and serialized once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    pub fields: Vec<EmbedField>,
}

impl ChatMessage {
    #[must_use]
    pub fn new(color: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            color: Some(color),
            timestamp: Some(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(truncate_chars(title.into(), MAX_TITLE_CHARS));
        self
    }

    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(truncate_chars(description.into(), MAX_DESCRIPTION_CHARS));
        self
    }

    #[must_use]
    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    #[must_use]
    pub fn author(mut self, name: impl Into<String>) -> Self {
        self.author = Some(EmbedAuthor {
            name: truncate_chars(name.into(), MAX_AUTHOR_CHARS),
        });
        self
    }

    #[must_use]
    pub fn footer(mut self, text: impl Into<String>, icon_url: Option<String>) -> Self {
        self.footer = Some(EmbedFooter {
            text: truncate_chars(text.into(), MAX_FOOTER_CHARS),
            icon_url,
        });
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        let name = name.into();
        if self.fields.len() >= MAX_FIELDS {
            warn!("Dropping embed field '{}': limit of {} reached", name, MAX_FIELDS);
            return self;
        }
        self.fields.push(EmbedField {
            name: truncate_chars(name, MAX_FIELD_NAME_CHARS),
            value: truncate_chars(value.into(), MAX_FIELD_VALUE_CHARS),
            inline,
        });
        self
    }

    /// Characters Discord counts toward the per-embed total.
    #[must_use]
    pub fn char_count(&self) -> usize {
        char_len(self.title.as_deref())
            + char_len(self.description.as_deref())
            + char_len(self.author.as_ref().map(|a| a.name.as_str()))
            + char_len(self.footer.as_ref().map(|f| f.text.as_str()))
            + self
                .fields
                .iter()
                .map(|f| f.name.chars().count() + f.value.chars().count())
                .sum::<usize>()
    }

    /// The message, shortened to fit the per-embed total if needed.
    ///
    /// The description is cut first, then trailing fields are dropped.
    #[must_use]
    pub fn within_total_limit(&self) -> Cow<'_, ChatMessage> {
        let total = self.char_count();
        if total <= MAX_EMBED_CHARS {
            return Cow::Borrowed(self);
        }

        let mut message = self.clone();
        let mut overflow = total - MAX_EMBED_CHARS;
        if let Some(description) = message.description.take() {
            let len = description.chars().count();
            let keep = len.saturating_sub(overflow);
            overflow -= len - keep;
            if keep > 0 {
                message.description = Some(truncate_chars(description, keep));
            }
        }
        while overflow > 0 {
            let Some(field) = message.fields.pop() else {
                break;
            };
            overflow = overflow.saturating_sub(field.name.chars().count() + field.value.chars().count());
        }
        warn!(
            "Embed shortened from {} to {} characters",
            total,
            message.char_count()
        );
        Cow::Owned(message)
    }
}

/// Parses `#RRGGBB` (or `RRGGBB`) into Discord's integer color.
#[must_use]
pub fn parse_hex_color(raw: &str) -> Option<u32> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}
