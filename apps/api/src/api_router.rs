use academy_core::AppError;
use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;
use crate::{auth, handlers, middleware};

pub fn build_router<Store>(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<Store>,
) -> Result<Router, AppError>
where
    Store: SessionStore + Clone,
{
    let api_routes = Router::new()
        .route(
            "/api/students",
            get(handlers::students::list_students_handler)
                .post(handlers::students::create_student_handler),
        )
        .route(
            "/api/students/{student_id}",
            get(handlers::students::get_student_handler)
                .put(handlers::students::update_student_handler)
                .delete(handlers::students::delete_student_handler),
        )
        .route(
            "/api/batches",
            get(handlers::batches::list_batches_handler)
                .post(handlers::batches::create_batch_handler),
        )
        .route(
            "/api/batches/{batch_id}",
            get(handlers::batches::get_batch_handler)
                .put(handlers::batches::update_batch_handler)
                .delete(handlers::batches::delete_batch_handler),
        )
        .route(
            "/api/batches/{batch_id}/attendance",
            post(handlers::attendance::mark_bulk_attendance_handler),
        )
        .route(
            "/api/batches/{batch_id}/attendance/{student_id}",
            put(handlers::attendance::mark_attendance_handler),
        )
        .route(
            "/api/attendance",
            get(handlers::attendance::list_attendance_handler),
        )
        .route(
            "/api/fees",
            get(handlers::fees::list_fees_handler).post(handlers::fees::create_fee_handler),
        )
        .route(
            "/api/fees/overdue-sweep",
            post(handlers::fees::overdue_sweep_handler),
        )
        .route(
            "/api/fees/{fee_id}",
            get(handlers::fees::get_fee_handler)
                .put(handlers::fees::update_fee_handler)
                .delete(handlers::fees::delete_fee_handler),
        )
        .route("/api/fees/{fee_id}/pay", post(handlers::fees::pay_fee_handler))
        .route("/api/activity", get(handlers::activity::list_activity_handler))
        .route("/auth/me", get(auth::me_handler));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/session", post(auth::session_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(api_routes)
        .route_layer(from_fn(middleware::attach_caller))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
