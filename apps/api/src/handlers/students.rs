use academy_core::Caller;
use academy_domain::StudentId;
use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use crate::dto::{ListResponse, StudentListQuery, StudentRequest, StudentResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::authenticated;

pub async fn list_students_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Query(query): Query<StudentListQuery>,
) -> ApiResult<Json<ListResponse<StudentResponse>>> {
    let caller = authenticated(caller)?;
    let (filter, sort, page) = query.into_parts()?;
    let students = state
        .student_service
        .list(&caller, filter, sort, page)
        .await?;

    Ok(Json(ListResponse::from_page(students)))
}

pub async fn get_student_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Path(student_id): Path<String>,
) -> ApiResult<Json<StudentResponse>> {
    let caller = authenticated(caller)?;
    let student = state
        .student_service
        .get(&caller, StudentId::parse(&student_id)?)
        .await?;

    Ok(Json(StudentResponse::from(student)))
}

pub async fn create_student_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Json(payload): Json<StudentRequest>,
) -> ApiResult<(StatusCode, Json<StudentResponse>)> {
    let caller = authenticated(caller)?;
    let student = state
        .student_service
        .create(&caller, payload.into_write()?)
        .await?;

    Ok((StatusCode::CREATED, Json(StudentResponse::from(student))))
}

pub async fn update_student_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Path(student_id): Path<String>,
    Json(payload): Json<StudentRequest>,
) -> ApiResult<Json<StudentResponse>> {
    let caller = authenticated(caller)?;
    let student = state
        .student_service
        .update(&caller, StudentId::parse(&student_id)?, payload.into_write()?)
        .await?;

    Ok(Json(StudentResponse::from(student)))
}

pub async fn delete_student_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Path(student_id): Path<String>,
) -> ApiResult<StatusCode> {
    let caller = authenticated(caller)?;
    state
        .student_service
        .delete(&caller, StudentId::parse(&student_id)?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
