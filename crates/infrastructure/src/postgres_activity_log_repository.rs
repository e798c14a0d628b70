use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use academy_application::{
    ActivityEntry, ActivityLogEntry, ActivityLogQuery, ActivityLogRepository,
};
use academy_core::{AppError, AppResult, UserId};

/// PostgreSQL-backed append-only activity log.
#[derive(Clone)]
pub struct PostgresActivityLogRepository {
    pool: PgPool,
}

impl PostgresActivityLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ActivityLogRow {
    id: i64,
    actor_id: uuid::Uuid,
    action: String,
    resource_type: String,
    resource_id: String,
    detail: Option<String>,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl ActivityLogRepository for PostgresActivityLogRepository {
    async fn append_entry(&self, entry: ActivityEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log_entries (
                actor_id,
                action,
                resource_type,
                resource_id,
                detail
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.actor_id.as_uuid())
        .bind(entry.action.as_str())
        .bind(entry.resource_type)
        .bind(entry.resource_id)
        .bind(entry.detail)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to append activity entry: {error}"))
        })?;

        Ok(())
    }

    async fn list_recent_entries(
        &self,
        query: ActivityLogQuery,
    ) -> AppResult<Vec<ActivityLogEntry>> {
        let capped_limit = query.limit.clamp(1, 200) as i64;
        let capped_offset = query.offset.min(5_000) as i64;
        let rows = sqlx::query_as::<_, ActivityLogRow>(
            r#"
            SELECT id, actor_id, action, resource_type, resource_id, detail, created_at
            FROM activity_log_entries
            WHERE ($1::TEXT IS NULL OR action = $1)
                AND ($2::UUID IS NULL OR actor_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            OFFSET $4
            "#,
        )
        .bind(query.action.map(|action| action.as_str()))
        .bind(query.actor_id.map(|actor_id| actor_id.as_uuid()))
        .bind(capped_limit)
        .bind(capped_offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list activity entries: {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| ActivityLogEntry {
                entry_id: row.id,
                actor_id: UserId::from_uuid(row.actor_id),
                action: row.action,
                resource_type: row.resource_type,
                resource_id: row.resource_id,
                detail: row.detail,
                created_at: row.created_at,
            })
            .collect())
    }
}
