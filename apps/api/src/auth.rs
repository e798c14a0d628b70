use academy_application::AuthorizationService;
use academy_core::{AppError, Caller};
use academy_domain::EmailAddress;
use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::dto::{CallerResponse, SessionRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_CALLER_KEY: &str = "caller";

/// Signs in an existing account with the shared bootstrap token.
pub async fn session_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<SessionRequest>,
) -> ApiResult<Json<CallerResponse>> {
    if payload.token != state.bootstrap_token {
        warn!("session rejected: invalid bootstrap token");
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let email = EmailAddress::new(payload.email)
        .map_err(|_| AppError::Unauthorized("unknown account".to_owned()))?;
    let account = state
        .user_repository
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("unknown account".to_owned()))?;
    let caller = Caller::new(account.id(), account.role());

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;
    session
        .insert(SESSION_CALLER_KEY, caller)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist session caller: {error}")))?;

    info!(caller_id = %caller.id(), role = caller.role().as_str(), "session started");
    Ok(Json(CallerResponse::from(account)))
}

pub async fn me_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Option<Caller>>,
) -> ApiResult<Json<CallerResponse>> {
    let caller = AuthorizationService::require_authenticated(caller.as_ref())?;
    let account = state
        .user_repository
        .find_user(caller.id())
        .await?
        .ok_or_else(|| AppError::Unauthorized("session account no longer exists".to_owned()))?;

    Ok(Json(CallerResponse::from(account)))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .flush()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}
