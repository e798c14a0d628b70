//! Process-local rate limit store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use academy_application::{AttemptInfo, RateLimitRepository};
use academy_core::{AppError, AppResult};

/// Fixed-window counters held in memory.
///
/// The mutex serializes increments, so two concurrent attempts never observe
/// the same count. Expired windows are evicted by `cleanup_expired`.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitRepository {
    windows: Mutex<HashMap<String, AttemptInfo>>,
}

impl InMemoryRateLimitRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn record_attempt_at(
        &self,
        key: &str,
        window_duration_seconds: i64,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptInfo> {
        if window_duration_seconds <= 0 {
            return Err(AppError::Validation(
                "window_duration_seconds must be greater than zero".to_owned(),
            ));
        }

        let window = Duration::seconds(window_duration_seconds);
        let mut windows = self.windows.lock().await;
        let current = windows.entry(key.to_owned()).or_insert(AttemptInfo {
            attempt_count: 0,
            window_started_at: now,
        });

        if current.window_started_at + window <= now {
            current.attempt_count = 0;
            current.window_started_at = now;
        }
        current.attempt_count = current.attempt_count.saturating_add(1);

        Ok(current.clone())
    }
}

#[async_trait]
impl RateLimitRepository for InMemoryRateLimitRepository {
    async fn record_attempt(
        &self,
        key: &str,
        window_duration_seconds: i64,
    ) -> AppResult<AttemptInfo> {
        self.record_attempt_at(key, window_duration_seconds, Utc::now())
            .await
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut windows = self.windows.lock().await;
        let initial = windows.len();
        windows.retain(|_, info| info.window_started_at >= before);

        Ok((initial - windows.len()) as u64)
    }
}
