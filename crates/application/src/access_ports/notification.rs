use async_trait::async_trait;

use academy_core::AppResult;

/// Outbound message delivery (email, SMS). Delivery is best-effort.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Sends one message to `target`, typically an email address.
    async fn send(&self, target: &str, subject: &str, body: &str) -> AppResult<()>;
}
