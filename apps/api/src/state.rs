use std::sync::Arc;

use academy_application::{
    ActivityService, AttendanceService, BatchService, FeeService, RateLimitService, StudentService,
    UserRepository,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub student_service: StudentService,
    pub batch_service: BatchService,
    pub fee_service: FeeService,
    pub attendance_service: AttendanceService,
    pub activity_service: ActivityService,
    pub rate_limit_service: RateLimitService,
    pub user_repository: Arc<dyn UserRepository>,
    /// Present only for the PostgreSQL storage backend.
    pub postgres_pool: Option<PgPool>,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
