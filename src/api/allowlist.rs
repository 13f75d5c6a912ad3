//! Source address check for inbound webhooks.

/// Addresses Linear delivers webhooks from.
pub const LINEAR_TRUSTED_IPS: [&str; 4] = [
    "35.231.147.226",
    "35.243.134.228",
    "34.38.87.206",
    "34.140.253.14",
];

/// First hop of an `X-Forwarded-For` value.
#[must_use]
pub fn client_ip(forwarded_for: &str) -> &str {
    forwarded_for.split(',').next().unwrap_or_default().trim()
}

#[must_use]
pub fn is_trusted(forwarded_for: &str) -> bool {
    LINEAR_TRUSTED_IPS.contains(&client_ip(forwarded_for))
}
