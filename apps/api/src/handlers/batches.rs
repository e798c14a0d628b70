use academy_core::Caller;
use academy_domain::BatchId;
use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use crate::dto::{BatchListQuery, BatchRequest, BatchResponse, ListResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::authenticated;

pub async fn list_batches_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Query(query): Query<BatchListQuery>,
) -> ApiResult<Json<ListResponse<BatchResponse>>> {
    let caller = authenticated(caller)?;
    let (filter, sort, page) = query.into_parts()?;
    let batches = state.batch_service.list(&caller, filter, sort, page).await?;

    Ok(Json(ListResponse::from_page(batches)))
}

pub async fn get_batch_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Path(batch_id): Path<String>,
) -> ApiResult<Json<BatchResponse>> {
    let caller = authenticated(caller)?;
    let batch = state
        .batch_service
        .get(&caller, BatchId::parse(&batch_id)?)
        .await?;

    Ok(Json(BatchResponse::from(batch)))
}

pub async fn create_batch_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Json(payload): Json<BatchRequest>,
) -> ApiResult<(StatusCode, Json<BatchResponse>)> {
    let caller = authenticated(caller)?;
    let batch = state
        .batch_service
        .create(&caller, payload.into_input()?)
        .await?;

    Ok((StatusCode::CREATED, Json(BatchResponse::from(batch))))
}

pub async fn update_batch_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Path(batch_id): Path<String>,
    Json(payload): Json<BatchRequest>,
) -> ApiResult<Json<BatchResponse>> {
    let caller = authenticated(caller)?;
    let batch = state
        .batch_service
        .update(&caller, BatchId::parse(&batch_id)?, payload.into_input()?)
        .await?;

    Ok(Json(BatchResponse::from(batch)))
}

pub async fn delete_batch_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Path(batch_id): Path<String>,
) -> ApiResult<StatusCode> {
    let caller = authenticated(caller)?;
    state
        .batch_service
        .delete(&caller, BatchId::parse(&batch_id)?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
