//! Notification sender for local runs; messages go to the log.

use async_trait::async_trait;
use academy_application::NotificationSender;
use academy_core::AppResult;
use tracing::info;

/// Notification sender that writes every message to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotificationSender;

impl ConsoleNotificationSender {
    /// Creates a new console sender.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSender for ConsoleNotificationSender {
    async fn send(&self, target: &str, subject: &str, body: &str) -> AppResult<()> {
        info!(recipient = target, subject, body, "notification written to console");

        Ok(())
    }
}
