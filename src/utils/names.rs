use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("static regex compile"));

#[must_use]
pub fn is_email(input: &str) -> bool {
    EMAIL_RE.is_match(input)
}

/// Display name for a Linear user name.
///
/// Email-style names become their capitalized local part joined with `_`
/// (`john.doe@x.com` → `John_Doe`); anything else is returned unchanged.
#[must_use]
pub fn parse_linear_name(input: &str) -> String {
    if !is_email(input) {
        return input.to_string();
    }

    let local = input.split('@').next().unwrap_or_default();
    local
        .split('.')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join("_")
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
