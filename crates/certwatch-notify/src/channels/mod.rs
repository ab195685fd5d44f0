//! Built-in notification channels.

pub mod noop;
pub mod slack;
pub mod teams;

use std::str::FromStr;

use async_trait::async_trait;
use certwatch_common::types::CertCheckNotification;
use serde_json::Value;

use crate::card::{self, NotificationCard, DEFAULT_TITLE};
use crate::error::NotifyError;
use crate::Notifier;

/// Which webhook dialect a [`WebhookNotifier`] speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Teams,
    Slack,
}

impl FromStr for NotifierKind {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "teams" => Ok(Self::Teams),
            "slack" => Ok(Self::Slack),
            other => Err(NotifyError::UnknownKind(other.to_string())),
        }
    }
}

/// Delivers check summaries to an incoming-webhook endpoint.
///
/// The HTTP client is constructed once and reused across deliveries.
pub struct WebhookNotifier {
    kind: NotifierKind,
    webhook_url: String,
    title: String,
    description: String,
    notification_url: Option<String>,
    mentions: Vec<String>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// `title` and `description` fall back to the stock summary header;
    /// `mentions` is the raw comma-separated list from configuration.
    pub fn new(
        kind: NotifierKind,
        webhook_url: String,
        title: Option<String>,
        description: Option<String>,
        notification_url: Option<String>,
        mentions: &str,
    ) -> Self {
        Self {
            kind,
            webhook_url,
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: description.unwrap_or_else(card::default_description),
            notification_url,
            mentions: card::parse_mentions(mentions),
            client: reqwest::Client::new(),
        }
    }

    fn render(&self, items: &[CertCheckNotification]) -> Value {
        let card = NotificationCard {
            title: self.title.clone(),
            description: self.description.clone(),
            notification_url: self.notification_url.clone(),
            mentions: self.mentions.clone(),
            items,
        };
        match self.kind {
            NotifierKind::Teams => teams::render(&card),
            NotifierKind::Slack => slack::render(&card),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, items: &[CertCheckNotification]) -> Result<(), NotifyError> {
        let payload = self.render(items);

        tracing::debug!(
            channel = self.channel_name(),
            items = items.len(),
            "Sending notification"
        );

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        Ok(())
    }

    fn channel_name(&self) -> &str {
        match self.kind {
            NotifierKind::Teams => "teams",
            NotifierKind::Slack => "slack",
        }
    }
}
