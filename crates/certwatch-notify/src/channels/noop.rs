use async_trait::async_trait;
use certwatch_common::types::CertCheckNotification;

use crate::error::NotifyError;
use crate::Notifier;

/// Accepts every batch without delivering anything. Used when no webhook
/// is configured so the scheduler keeps a single code path.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, items: &[CertCheckNotification]) -> Result<(), NotifyError> {
        tracing::debug!(items = items.len(), "No notifier configured, dropping batch");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "none"
    }
}
