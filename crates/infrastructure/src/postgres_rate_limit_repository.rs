//! Fixed-window write budget counters stored in the `rate_limits` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use academy_application::{AttemptInfo, RateLimitRepository};
use academy_core::{AppError, AppResult};

/// PostgreSQL implementation of the rate limit repository port.
#[derive(Clone)]
pub struct PostgresRateLimitRepository {
    pool: PgPool,
}

impl PostgresRateLimitRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CounterRow {
    attempt_count: i32,
    window_started_at: DateTime<Utc>,
}

#[async_trait]
impl RateLimitRepository for PostgresRateLimitRepository {
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

        // One statement: concurrent writers serialize on the row lock.
        let row = sqlx::query_as::<_, CounterRow>(
            r#"
            INSERT INTO rate_limits AS counter (key, window_started_at, attempt_count)
            VALUES ($1, now(), 1)
            ON CONFLICT (key) DO UPDATE
            SET
                attempt_count = CASE
                    WHEN counter.window_started_at <= now() - make_interval(secs => $2::float8)
                    THEN 1
                    ELSE counter.attempt_count + 1
                END,
                window_started_at = CASE
                    WHEN counter.window_started_at <= now() - make_interval(secs => $2::float8)
                    THEN now()
                    ELSE counter.window_started_at
                END
            RETURNING attempt_count, window_started_at
            "#,
        )
        .bind(key)
        .bind(window_duration_seconds as f64)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to record write attempt for '{key}': {error}"))
        })?;

        Ok(AttemptInfo {
            attempt_count: row.attempt_count,
            window_started_at: row.window_started_at,
        })
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM rate_limits WHERE window_started_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to evict expired rate limit windows: {error}"))
            })?;

        Ok(result.rows_affected())
    }
}
