use std::sync::Arc;

use academy_application::{
    ActivityLogRepository, ActivityService, AttendanceLedger, AttendanceScope, AttendanceService,
    AuthorizationService, BatchRepository, BatchScope, BatchService, FeeRepository, FeeScope,
    FeeService, RateLimitRepository, RateLimitRule, RateLimitService, StudentRepository,
    StudentScope, StudentService, UserRepository,
};
use academy_core::{AppError, AppResult};
use academy_infrastructure::{
    ConsoleNotificationSender, InMemoryAcademyRepository, InMemoryActivityLogRepository,
    InMemoryRateLimitRepository, PostgresAcademyRepository, PostgresActivityLogRepository,
    PostgresRateLimitRepository, RedisRateLimitRepository,
};
use sqlx::PgPool;
use tracing::info;

use crate::api_config::{ApiConfig, RateLimitBackend, StorageBackend};
use crate::state::AppState;

use super::redis::build_redis_client;

/// Storage adapters for one backend.
#[derive(Clone)]
pub struct StorageSet {
    pub student_repository: Arc<dyn StudentRepository>,
    pub batch_repository: Arc<dyn BatchRepository>,
    pub fee_repository: Arc<dyn FeeRepository>,
    pub attendance_ledger: Arc<dyn AttendanceLedger>,
    pub user_repository: Arc<dyn UserRepository>,
    pub activity_repository: Arc<dyn ActivityLogRepository>,
    pub rate_limit_repository: Arc<dyn RateLimitRepository>,
    pub postgres_pool: Option<PgPool>,
}

impl StorageSet {
    pub fn postgres(pool: PgPool, rate_limit_repository: Arc<dyn RateLimitRepository>) -> Self {
        let academy = Arc::new(PostgresAcademyRepository::new(pool.clone()));
        Self {
            student_repository: academy.clone(),
            batch_repository: academy.clone(),
            fee_repository: academy.clone(),
            attendance_ledger: academy.clone(),
            user_repository: academy,
            activity_repository: Arc::new(PostgresActivityLogRepository::new(pool.clone())),
            rate_limit_repository,
            postgres_pool: Some(pool),
        }
    }

    pub fn in_memory(rate_limit_repository: Arc<dyn RateLimitRepository>) -> Self {
        let academy = Arc::new(InMemoryAcademyRepository::new());
        Self {
            student_repository: academy.clone(),
            batch_repository: academy.clone(),
            fee_repository: academy.clone(),
            attendance_ledger: academy.clone(),
            user_repository: academy,
            activity_repository: Arc::new(InMemoryActivityLogRepository::new()),
            rate_limit_repository,
            postgres_pool: None,
        }
    }
}

pub async fn build_app_state(config: &ApiConfig, pool: Option<PgPool>) -> AppResult<AppState> {
    let rate_limit_repository = build_rate_limit_repository(config, pool.as_ref()).await?;
    let storage = match (config.storage_backend, pool) {
        (StorageBackend::Postgres, Some(pool)) => StorageSet::postgres(pool, rate_limit_repository),
        (StorageBackend::Postgres, None) => {
            return Err(AppError::Internal(
                "postgres storage requires a database connection".to_owned(),
            ));
        }
        (StorageBackend::Memory, _) => StorageSet::in_memory(rate_limit_repository),
    };

    info!(
        storage = ?config.storage_backend,
        rate_limit = ?config.rate_limit_backend,
        "storage adapters selected"
    );

    Ok(assemble_state(
        storage,
        config.write_rate_limit.clone(),
        config.frontend_url.clone(),
        config.bootstrap_token.clone(),
    ))
}

/// Wires every service over one storage set.
pub fn assemble_state(
    storage: StorageSet,
    write_rule: RateLimitRule,
    frontend_url: String,
    bootstrap_token: String,
) -> AppState {
    let rate_limit_service = RateLimitService::new(storage.rate_limit_repository.clone());
    let authorization_service = AuthorizationService::new(rate_limit_service.clone(), write_rule);
    let activity_service = ActivityService::new(
        storage.activity_repository.clone(),
        Arc::new(ConsoleNotificationSender::new()),
        storage.student_repository.clone(),
        storage.user_repository.clone(),
    );

    AppState {
        student_service: StudentService::new(
            authorization_service.clone(),
            Arc::new(StudentScope),
            storage.student_repository.clone(),
            storage.user_repository.clone(),
            activity_service.clone(),
        ),
        batch_service: BatchService::new(
            authorization_service.clone(),
            Arc::new(BatchScope),
            storage.batch_repository.clone(),
            storage.user_repository.clone(),
            activity_service.clone(),
        ),
        fee_service: FeeService::new(
            authorization_service.clone(),
            Arc::new(FeeScope),
            storage.fee_repository.clone(),
            activity_service.clone(),
        ),
        attendance_service: AttendanceService::new(
            authorization_service,
            Arc::new(AttendanceScope),
            storage.attendance_ledger.clone(),
            storage.batch_repository.clone(),
            activity_service.clone(),
        ),
        activity_service,
        rate_limit_service,
        user_repository: storage.user_repository,
        postgres_pool: storage.postgres_pool,
        frontend_url,
        bootstrap_token,
    }
}

async fn build_rate_limit_repository(
    config: &ApiConfig,
    pool: Option<&PgPool>,
) -> AppResult<Arc<dyn RateLimitRepository>> {
    match config.rate_limit_backend {
        RateLimitBackend::Memory => Ok(Arc::new(InMemoryRateLimitRepository::new())),
        RateLimitBackend::Postgres => {
            let pool = pool.ok_or_else(|| {
                AppError::Validation(
                    "DATABASE_URL is required when RATE_LIMIT_BACKEND=postgres".to_owned(),
                )
            })?;
            Ok(Arc::new(PostgresRateLimitRepository::new(pool.clone())))
        }
        RateLimitBackend::Redis => {
            let redis_url = config.redis_url.as_deref().ok_or_else(|| {
                AppError::Validation(
                    "REDIS_URL is required when RATE_LIMIT_BACKEND=redis".to_owned(),
                )
            })?;
            let client = build_redis_client(redis_url)?;
            Ok(Arc::new(
                RedisRateLimitRepository::connect(client, "academy:rate_limit").await?,
            ))
        }
    }
}
