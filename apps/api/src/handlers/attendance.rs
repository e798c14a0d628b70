use academy_core::Caller;
use academy_domain::{BatchId, StudentId};
use axum::Json;
use axum::extract::{Extension, Path, Query, State};

use crate::dto::{
    AttendanceListQuery, AttendanceMarkRequest, AttendanceRecordResponse, BulkAttendanceRequest,
    ListResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

use super::authenticated;

pub async fn list_attendance_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Query(query): Query<AttendanceListQuery>,
) -> ApiResult<Json<ListResponse<AttendanceRecordResponse>>> {
    let caller = authenticated(caller)?;
    let (filter, sort, page) = query.into_parts()?;
    let records = state
        .attendance_service
        .list(&caller, filter, sort, page)
        .await?;

    Ok(Json(ListResponse::from_page(records)))
}

pub async fn mark_bulk_attendance_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Path(batch_id): Path<String>,
    Json(payload): Json<BulkAttendanceRequest>,
) -> ApiResult<Json<Vec<AttendanceRecordResponse>>> {
    let caller = authenticated(caller)?;
    let batch_id = BatchId::parse(&batch_id)?;
    let (date, entries) = payload.into_entries()?;
    let records = state
        .attendance_service
        .mark_bulk(&caller, batch_id, date, entries)
        .await?
        .into_iter()
        .map(AttendanceRecordResponse::from)
        .collect();

    Ok(Json(records))
}

pub async fn mark_attendance_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Path((batch_id, student_id)): Path<(String, String)>,
    Json(payload): Json<AttendanceMarkRequest>,
) -> ApiResult<Json<AttendanceRecordResponse>> {
    let caller = authenticated(caller)?;
    let (date, status) = payload.into_parts()?;
    let record = state
        .attendance_service
        .mark_one(
            &caller,
            BatchId::parse(&batch_id)?,
            date,
            StudentId::parse(&student_id)?,
            status,
        )
        .await?;

    Ok(Json(AttendanceRecordResponse::from(record)))
}
