use academy_core::Caller;
use academy_domain::FeeId;
use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;

use crate::dto::{
    FeeListQuery, FeeRequest, FeeResponse, ListResponse, OverdueSweepRequest, PayFeeRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

use super::authenticated;

pub async fn list_fees_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Query(query): Query<FeeListQuery>,
) -> ApiResult<Json<ListResponse<FeeResponse>>> {
    let caller = authenticated(caller)?;
    let (filter, sort, page) = query.into_parts()?;
    let fees = state.fee_service.list(&caller, filter, sort, page).await?;

    Ok(Json(ListResponse::from_page(fees)))
}

pub async fn get_fee_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Path(fee_id): Path<String>,
) -> ApiResult<Json<FeeResponse>> {
    let caller = authenticated(caller)?;
    let fee = state.fee_service.get(&caller, FeeId::parse(&fee_id)?).await?;

    Ok(Json(FeeResponse::from(fee)))
}

pub async fn create_fee_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Json(payload): Json<FeeRequest>,
) -> ApiResult<(StatusCode, Json<FeeResponse>)> {
    let caller = authenticated(caller)?;
    let fee = state
        .fee_service
        .create(&caller, payload.into_input()?)
        .await?;

    Ok((StatusCode::CREATED, Json(FeeResponse::from(fee))))
}

pub async fn update_fee_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Path(fee_id): Path<String>,
    Json(payload): Json<FeeRequest>,
) -> ApiResult<Json<FeeResponse>> {
    let caller = authenticated(caller)?;
    let fee = state
        .fee_service
        .update(&caller, FeeId::parse(&fee_id)?, payload.into_input()?)
        .await?;

    Ok(Json(FeeResponse::from(fee)))
}

pub async fn delete_fee_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Path(fee_id): Path<String>,
) -> ApiResult<StatusCode> {
    let caller = authenticated(caller)?;
    state
        .fee_service
        .delete(&caller, FeeId::parse(&fee_id)?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn pay_fee_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    Path(fee_id): Path<String>,
    payload: Option<Json<PayFeeRequest>>,
) -> ApiResult<Json<FeeResponse>> {
    let caller = authenticated(caller)?;
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    let paid_on = payload.paid_on_or(Utc::now().date_naive())?;
    let fee = state
        .fee_service
        .mark_paid(&caller, FeeId::parse(&fee_id)?, paid_on)
        .await?;

    Ok(Json(FeeResponse::from(fee)))
}

pub async fn overdue_sweep_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
    payload: Option<Json<OverdueSweepRequest>>,
) -> ApiResult<Json<Vec<FeeResponse>>> {
    let caller = authenticated(caller)?;
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    let today = payload.today_or(Utc::now().date_naive())?;
    let changed = state
        .fee_service
        .mark_overdue(&caller, today)
        .await?
        .into_iter()
        .map(FeeResponse::from)
        .collect();

    Ok(Json(changed))
}
