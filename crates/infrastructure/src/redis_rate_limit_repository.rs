//! Redis-backed rate limit repository.
//!
//! Counters are plain keys with a TTL equal to the window, so expired windows
//! disappear without a cleanup pass.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use academy_application::{AttemptInfo, RateLimitRepository};
use academy_core::{AppError, AppResult};
use redis::Script;
use redis::aio::ConnectionManager;

// Returns the post-increment count and the window start as epoch seconds.
const INCREMENT_WINDOW_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
  redis.call('EXPIRE', KEYS[1], ARGV[1])
end
local ttl = redis.call('TTL', KEYS[1])
if ttl < 0 then
  redis.call('EXPIRE', KEYS[1], ARGV[1])
  ttl = tonumber(ARGV[1])
end
return {count, tonumber(ARGV[2]) - (tonumber(ARGV[1]) - ttl)}
"#;

/// Redis implementation of the rate limit repository port.
#[derive(Clone)]
pub struct RedisRateLimitRepository {
    connection: ConnectionManager,
    key_prefix: String,
    script: Script,
}

impl RedisRateLimitRepository {
    /// Connects to Redis and prepares the counter script.
    pub async fn connect(client: redis::Client, key_prefix: impl Into<String>) -> AppResult<Self> {
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;

        Ok(Self {
            connection,
            key_prefix: key_prefix.into(),
            script: Script::new(INCREMENT_WINDOW_SCRIPT),
        })
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }
}

#[async_trait]
impl RateLimitRepository for RedisRateLimitRepository {
    async fn record_attempt(
        &self,
        key: &str,
        window_duration_seconds: i64,
    ) -> AppResult<AttemptInfo> {
        if window_duration_seconds <= 0 {
            return Err(AppError::Validation(
                "window_duration_seconds must be greater than zero".to_owned(),
            ));
        }

        let mut connection = self.connection.clone();
        let (attempt_count, window_started_epoch): (i64, i64) = self
            .script
            .key(self.namespaced(key))
            .arg(window_duration_seconds)
            .arg(Utc::now().timestamp())
            .invoke_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to record write attempt in redis: {error}"))
            })?;

        let attempt_count = i32::try_from(attempt_count).unwrap_or(i32::MAX);
        let window_started_at = Utc
            .timestamp_opt(window_started_epoch, 0)
            .single()
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "redis returned an invalid window start '{window_started_epoch}'"
                ))
            })?;

        Ok(AttemptInfo {
            attempt_count,
            window_started_at,
        })
    }

    async fn cleanup_expired(&self, _before: DateTime<Utc>) -> AppResult<u64> {
        Ok(0)
    }
}
