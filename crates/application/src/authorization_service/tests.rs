use std::sync::Arc;

use academy_core::{AppError, AppResult, Caller, Role, UserId};
use academy_domain::Permission;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use proptest::prelude::*;
use tokio::sync::Mutex;

use crate::{AttemptInfo, RateLimitRepository, RateLimitRule, RateLimitService};

use super::AuthorizationService;

#[derive(Default)]
struct CountingRateLimitRepository {
    attempts: Mutex<i32>,
}

#[async_trait]
impl RateLimitRepository for CountingRateLimitRepository {
    async fn record_attempt(&self, _key: &str, _window: i64) -> AppResult<AttemptInfo> {
        let mut attempts = self.attempts.lock().await;
        *attempts += 1;
        Ok(AttemptInfo {
            attempt_count: *attempts,
            window_started_at: Utc::now(),
        })
    }

    async fn cleanup_expired(&self, _before: DateTime<Utc>) -> AppResult<u64> {
        Ok(0)
    }
}

struct UnavailableRateLimitRepository;

#[async_trait]
impl RateLimitRepository for UnavailableRateLimitRepository {
    async fn record_attempt(&self, _key: &str, _window: i64) -> AppResult<AttemptInfo> {
        Err(AppError::Internal("connection refused".to_owned()))
    }

    async fn cleanup_expired(&self, _before: DateTime<Utc>) -> AppResult<u64> {
        Ok(0)
    }
}

fn guard(repository: Arc<dyn RateLimitRepository>, max_attempts: i32) -> AuthorizationService {
    AuthorizationService::new(
        RateLimitService::new(repository),
        RateLimitRule::new("write", max_attempts, 60),
    )
}

fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Admin), Just(Role::Teacher), Just(Role::Parent)]
}

#[test]
fn missing_caller_is_unauthorized() {
    assert!(matches!(
        AuthorizationService::require_authenticated(None),
        Err(AppError::Unauthorized(_))
    ));

    let caller = Caller::new(UserId::new(), Role::Parent);
    assert!(AuthorizationService::require_authenticated(Some(&caller)).is_ok());
}

#[test]
fn require_role_accepts_listed_roles_only() {
    let teacher = Caller::new(UserId::new(), Role::Teacher);
    assert!(AuthorizationService::require_role(&teacher, &[Role::Admin, Role::Teacher]).is_ok());
    assert!(matches!(
        AuthorizationService::require_role(&teacher, &[Role::Admin]),
        Err(AppError::Forbidden(_))
    ));
}

#[test]
fn teacher_may_mark_but_not_read_fees() {
    let teacher = Caller::new(UserId::new(), Role::Teacher);
    assert!(AuthorizationService::require_permission(&teacher, Permission::MarkAttendance).is_ok());
    assert!(matches!(
        AuthorizationService::require_permission(&teacher, Permission::FeeRead),
        Err(AppError::Forbidden(_))
    ));
}

#[test]
fn ownership_admits_admin_and_owner() {
    let owner_id = UserId::new();
    assert!(AuthorizationService::is_owner(
        &Caller::new(owner_id, Role::Teacher),
        owner_id
    ));
    assert!(AuthorizationService::is_owner(
        &Caller::new(UserId::new(), Role::Admin),
        owner_id
    ));
    assert!(!AuthorizationService::is_owner(
        &Caller::new(UserId::new(), Role::Teacher),
        owner_id
    ));
}

#[tokio::test]
async fn write_budget_is_enforced_per_guard() {
    let service = guard(Arc::new(CountingRateLimitRepository::default()), 2);
    let admin = Caller::new(UserId::new(), Role::Admin);

    assert!(service.authorize_write(&admin, Permission::StudentWrite).await.is_ok());
    assert!(service.authorize_write(&admin, Permission::StudentWrite).await.is_ok());
    assert!(matches!(
        service.authorize_write(&admin, Permission::StudentWrite).await,
        Err(AppError::RateLimited(_))
    ));
}

#[tokio::test]
async fn permission_is_checked_before_budget_is_spent() {
    let repository = Arc::new(CountingRateLimitRepository::default());
    let service = guard(repository.clone(), 5);
    let parent = Caller::new(UserId::new(), Role::Parent);

    let result = service.authorize_write(&parent, Permission::FeeWrite).await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(*repository.attempts.lock().await, 0);
}

#[tokio::test]
async fn unavailable_rate_limiter_rejects_writes() {
    let service = guard(Arc::new(UnavailableRateLimitRepository), 5);
    let admin = Caller::new(UserId::new(), Role::Admin);

    assert!(matches!(
        service.check_write_rate_limit(&admin).await,
        Err(AppError::Internal(_))
    ));
}

proptest! {
    #[test]
    fn permission_guard_matches_role_table(role in role_strategy(), index in 0usize..9) {
        let permission = Permission::all()[index % Permission::all().len()];
        let caller = Caller::new(UserId::new(), role);
        let granted = academy_domain::permissions_for(role).contains(&permission);

        prop_assert_eq!(
            AuthorizationService::require_permission(&caller, permission).is_ok(),
            granted
        );
    }
}
