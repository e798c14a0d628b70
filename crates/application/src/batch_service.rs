//! Scoped batch access.

use std::sync::Arc;

use academy_core::{AppError, AppResult, Caller, FieldViolation, Role, UserId};
use academy_domain::{ActivityAction, Batch, BatchId, BatchInput, Permission};
use tracing::info;

use crate::{
    ActivityService, AuthorizationService, BatchFilter, BatchRepository, BatchSortField, Page,
    PageRequest, ResourceScope, ScopePredicate, ScopedQuery, Sort, UserRepository,
};

/// Application service for batches.
#[derive(Clone)]
pub struct BatchService {
    authorization_service: AuthorizationService,
    scope: Arc<dyn ResourceScope>,
    repository: Arc<dyn BatchRepository>,
    user_repository: Arc<dyn UserRepository>,
    activity_service: ActivityService,
}

impl BatchService {
    /// Creates a new batch service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        scope: Arc<dyn ResourceScope>,
        repository: Arc<dyn BatchRepository>,
        user_repository: Arc<dyn UserRepository>,
        activity_service: ActivityService,
    ) -> Self {
        Self {
            authorization_service,
            scope,
            repository,
            user_repository,
            activity_service,
        }
    }

    /// Lists batches visible to the caller.
    pub async fn list(
        &self,
        caller: &Caller,
        filter: BatchFilter,
        sort: Sort<BatchSortField>,
        page: PageRequest,
    ) -> AppResult<Page<Batch>> {
        AuthorizationService::require_permission(caller, Permission::BatchRead)?;
        let query = ScopedQuery::new(self.scope.predicate_for(caller), filter, sort, page);
        self.repository.list_batches(&query).await
    }

    /// Returns one batch visible to the caller.
    pub async fn get(&self, caller: &Caller, batch_id: BatchId) -> AppResult<Batch> {
        AuthorizationService::require_permission(caller, Permission::BatchRead)?;
        self.find_in_scope(&self.scope.predicate_for(caller), batch_id)
            .await
    }

    /// Creates a batch.
    pub async fn create(&self, caller: &Caller, input: BatchInput) -> AppResult<Batch> {
        self.authorization_service
            .authorize_write(caller, Permission::BatchWrite)
            .await?;
        let batch = Batch::new(BatchId::new(), input)?;
        self.ensure_teacher(batch.teacher_id()).await?;
        self.repository.insert_batch(&batch).await?;

        info!(caller_id = %caller.id(), batch_id = %batch.id(), "batch created");
        self.activity_service
            .record(caller, ActivityAction::BatchCreated, "batch", batch.id(), None)
            .await;
        Ok(batch)
    }

    /// Replaces a batch's attributes.
    pub async fn update(
        &self,
        caller: &Caller,
        batch_id: BatchId,
        input: BatchInput,
    ) -> AppResult<Batch> {
        self.authorization_service
            .authorize_write(caller, Permission::BatchWrite)
            .await?;
        self.find_in_scope(&self.scope.predicate_for(caller), batch_id)
            .await?;
        let batch = Batch::new(batch_id, input)?;
        self.ensure_teacher(batch.teacher_id()).await?;
        self.repository.update_batch(&batch).await?;

        self.activity_service
            .record(caller, ActivityAction::BatchUpdated, "batch", batch_id, None)
            .await;
        Ok(batch)
    }

    /// Deletes a batch with no attendance history and unassigns its students.
    pub async fn delete(&self, caller: &Caller, batch_id: BatchId) -> AppResult<()> {
        self.authorization_service
            .authorize_write(caller, Permission::BatchWrite)
            .await?;
        self.find_in_scope(&self.scope.predicate_for(caller), batch_id)
            .await?;
        self.repository.delete_batch(batch_id).await?;

        self.activity_service
            .record(caller, ActivityAction::BatchDeleted, "batch", batch_id, None)
            .await;
        Ok(())
    }

    async fn find_in_scope(&self, scope: &ScopePredicate, batch_id: BatchId) -> AppResult<Batch> {
        self.repository
            .find_batch(scope, batch_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("{} '{batch_id}' does not exist", self.scope.resource()))
            })
    }

    async fn ensure_teacher(&self, teacher_id: Option<UserId>) -> AppResult<()> {
        let Some(teacher_id) = teacher_id else {
            return Ok(());
        };

        match self.user_repository.find_user(teacher_id).await? {
            Some(account) if account.role() == Role::Teacher => Ok(()),
            _ => Err(AppError::InvalidFields(vec![FieldViolation::new(
                "teacher_id",
                "must reference a teacher account",
            )])),
        }
    }
}
