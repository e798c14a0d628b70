//! In-memory activity log for tests and the `memory` storage backend.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use academy_application::{
    ActivityEntry, ActivityLogEntry, ActivityLogQuery, ActivityLogRepository,
};
use academy_core::AppResult;

/// Append-only activity log held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryActivityLogRepository {
    entries: RwLock<Vec<ActivityLogEntry>>,
}

impl InMemoryActivityLogRepository {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityLogRepository for InMemoryActivityLogRepository {
    async fn append_entry(&self, entry: ActivityEntry) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        let entry_id = entries.len() as i64 + 1;
        entries.push(ActivityLogEntry {
            entry_id,
            actor_id: entry.actor_id,
            action: entry.action.as_str().to_owned(),
            resource_type: entry.resource_type,
            resource_id: entry.resource_id,
            detail: entry.detail,
            created_at: Utc::now(),
        });

        Ok(())
    }

    async fn list_recent_entries(
        &self,
        query: ActivityLogQuery,
    ) -> AppResult<Vec<ActivityLogEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .rev()
            .filter(|entry| {
                query
                    .action
                    .is_none_or(|action| entry.action == action.as_str())
            })
            .filter(|entry| query.actor_id.is_none_or(|actor_id| entry.actor_id == actor_id))
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }
}
