use std::sync::Arc;

use chrono::Utc;

use academy_core::AppResult;

use super::config::RateLimitRule;
use super::ports::RateLimitRepository;

/// Application service for rate limiting.
#[derive(Clone)]
pub struct RateLimitService {
    repository: Arc<dyn RateLimitRepository>,
}

impl RateLimitService {
    /// Creates a new rate limit service.
    #[must_use]
    pub fn new(repository: Arc<dyn RateLimitRepository>) -> Self {
        Self { repository }
    }

    /// Records an attempt for `identifier` and reports whether it is within budget.
    pub async fn allow(&self, rule: &RateLimitRule, identifier: &str) -> AppResult<bool> {
        let composite_key = format!("{}:{identifier}", rule.category);
        let info = self
            .repository
            .record_attempt(&composite_key, rule.window_seconds)
            .await?;

        Ok(info.attempt_count <= rule.max_attempts)
    }

    /// Removes expired rate limit entries. Intended for periodic cleanup.
    pub async fn cleanup(&self) -> AppResult<u64> {
        let cutoff = Utc::now() - chrono::Duration::hours(24);
        self.repository.cleanup_expired(cutoff).await
    }
}
