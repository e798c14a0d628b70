use async_trait::async_trait;
use chrono::{DateTime, Utc};

use academy_core::{AppResult, UserId};
use academy_domain::ActivityAction;

/// Activity event emitted after a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    /// User that performed the action.
    pub actor_id: UserId,
    /// Stable activity action identifier.
    pub action: ActivityAction,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Optional free-form detail.
    pub detail: Option<String>,
}

/// Stored activity row projected for the admin activity view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLogEntry {
    /// Monotonic entry identifier.
    pub entry_id: i64,
    /// User that performed the action.
    pub actor_id: UserId,
    /// Stable action identifier.
    pub action: String,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Optional free-form detail.
    pub detail: Option<String>,
    /// When the entry was appended.
    pub created_at: DateTime<Utc>,
}

/// Query parameters for activity listing, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLogQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped.
    pub offset: usize,
    /// Optional action filter.
    pub action: Option<ActivityAction>,
    /// Optional actor filter.
    pub actor_id: Option<UserId>,
}

/// Port for the append-only activity log.
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    /// Persists one activity entry.
    async fn append_entry(&self, entry: ActivityEntry) -> AppResult<()>;

    /// Lists entries newest first.
    async fn list_recent_entries(&self, query: ActivityLogQuery)
    -> AppResult<Vec<ActivityLogEntry>>;
}
