use academy_application::ActivityLogQuery;
use academy_core::Caller;
use axum::Json;
use axum::extract::{Extension, Query, State};

use crate::dto::{ActivityEntryResponse, ActivityListQuery};
use crate::error::ApiResult;
use crate::state::AppState;

use super::authenticated;

pub async fn list_activity_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Query(query): Query<ActivityListQuery>,
) -> ApiResult<Json<Vec<ActivityEntryResponse>>> {
    let caller = authenticated(caller)?;
    let entries = state
        .activity_service
        .list_recent(&caller, ActivityLogQuery::try_from(query)?)
        .await?
        .into_iter()
        .map(ActivityEntryResponse::from)
        .collect();

    Ok(Json(entries))
}
