use std::str::FromStr;

use academy_application::{ActivityLogEntry, ActivityLogQuery};
use academy_core::{AppResult, UserId};
use academy_domain::ActivityAction;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::parse_optional;

const DEFAULT_ACTIVITY_LIMIT: usize = 50;

/// Query parameters accepted by the activity feed.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub action: Option<String>,
    pub actor_id: Option<String>,
}

impl TryFrom<ActivityListQuery> for ActivityLogQuery {
    type Error = academy_core::AppError;

    fn try_from(query: ActivityListQuery) -> AppResult<Self> {
        Ok(Self {
            limit: query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT),
            offset: query.offset.unwrap_or(0),
            action: parse_optional("action", query.action.as_deref(), ActivityAction::from_str)?,
            actor_id: parse_optional("actor_id", query.actor_id.as_deref(), UserId::parse)?,
        })
    }
}

/// API representation of one activity entry.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/activity-entry-response.ts"
)]
pub struct ActivityEntryResponse {
    #[ts(type = "number")]
    pub entry_id: i64,
    pub actor_id: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub detail: Option<String>,
    pub created_at: String,
}

impl From<ActivityLogEntry> for ActivityEntryResponse {
    fn from(entry: ActivityLogEntry) -> Self {
        Self {
            entry_id: entry.entry_id,
            actor_id: entry.actor_id.to_string(),
            action: entry.action,
            resource_type: entry.resource_type,
            resource_id: entry.resource_id,
            detail: entry.detail,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}
