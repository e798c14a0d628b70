use academy_core::{AppError, Caller};
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use tower_sessions::Session;

use crate::auth::SESSION_CALLER_KEY;
use crate::error::ApiResult;
use crate::state::AppState;

/// Exposes the session caller, if any, as an `Option<Caller>` extension.
///
/// Handlers decide whether a caller is required.
pub async fn attach_caller(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let caller = session
        .get::<Caller>(SESSION_CALLER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session caller: {error}")))?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        let headers = request.headers();

        if headers.get("sec-fetch-site") == Some(&HeaderValue::from_static("cross-site")) {
            return Err(AppError::Forbidden("cross-site request blocked".to_owned()).into());
        }

        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok());
        let referer = headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok());

        if !origin_matches(&state.frontend_url, origin, referer) {
            return Err(AppError::Forbidden("origin validation failed".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

/// Requests without either header come from non-browser clients and pass.
fn origin_matches(allowed: &str, origin: Option<&str>, referer: Option<&str>) -> bool {
    match (origin, referer) {
        (None, None) => true,
        (origin, referer) => {
            origin == Some(allowed) || referer.is_some_and(|referer| referer.starts_with(allowed))
        }
    }
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
