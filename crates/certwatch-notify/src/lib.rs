//! Notification delivery with pluggable channel support.
//!
//! Check summaries are handed to a [`Notifier`] implementation once per
//! scheduler execution. Built-in channels render Microsoft Teams adaptive
//! cards and Slack block kit payloads and deliver them over an incoming
//! webhook; [`channels::noop::NoopNotifier`] swallows batches for
//! deployments without a webhook.

pub mod card;
pub mod channels;
pub mod error;


use async_trait::async_trait;
use certwatch_common::types::CertCheckNotification;

use error::NotifyError;

/// A notification delivery channel that sends one batch of check
/// summaries to an external service.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers the batch through this channel.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or delivery fails; the caller decides
    /// whether that is fatal.
    async fn notify(&self, items: &[CertCheckNotification]) -> Result<(), NotifyError>;

    /// Returns the channel type name (e.g., `"teams"`, `"slack"`).
    fn channel_name(&self) -> &str;
}
