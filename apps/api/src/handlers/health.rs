use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use crate::dto::HealthResponse;
use crate::state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let Some(pool) = state.postgres_pool else {
        return (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                storage: "memory",
            }),
        );
    };

    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                storage: "postgres",
            }),
        ),
        Err(error) => {
            warn!(error = %error, "postgres health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    storage: "postgres",
                }),
            )
        }
    }
}
