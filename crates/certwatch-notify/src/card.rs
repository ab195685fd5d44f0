//! The rendering model shared by the webhook channels.

use certwatch_common::types::CertCheckNotification;
use chrono::Utc;

/// Title used when the deployment does not configure one.
pub const DEFAULT_TITLE: &str = "Sharp Cert Manager Summary";

/// Everything a channel renderer needs to build one outgoing message.
///
/// The card is assembled fresh for every delivery; renderers never consult
/// anything outside of it, so rendering is deterministic.
pub struct NotificationCard<'a> {
    pub title: String,
    pub description: String,
    /// Link target for the "View details" action; the action is omitted
    /// entirely when unset.
    pub notification_url: Option<String>,
    pub mentions: Vec<String>,
    pub items: &'a [CertCheckNotification],
}

/// Description used when the deployment does not configure one, stamped
/// with the current date.
pub fn default_description() -> String {
    format!(
        "The following certificates were checked on {}",
        Utc::now().format("%m/%d/%Y")
    )
}

/// Splits a comma-separated mention list into individual handles.
/// Whitespace around entries is dropped, as are empty entries.
///
/// # Examples
///
/// ```
/// use certwatch_notify::card::parse_mentions;
///
/// assert_eq!(parse_mentions("@ops, @alice"), vec!["@ops", "@alice"]);
/// assert!(parse_mentions("").is_empty());
/// ```
pub fn parse_mentions(mentions: &str) -> Vec<String> {
    mentions
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
