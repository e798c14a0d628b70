//! Scoped fee access and settlement.

use std::sync::Arc;

use academy_core::{AppError, AppResult, Caller};
use academy_domain::{ActivityAction, FeeId, FeeInput, FeeRecord, Permission};
use chrono::NaiveDate;
use tracing::info;

use crate::{
    ActivityService, AuthorizationService, FeeFilter, FeeRepository, FeeSortField, Page,
    PageRequest, ResourceScope, ScopedQuery, Sort,
};

/// Application service for fee records.
#[derive(Clone)]
pub struct FeeService {
    authorization_service: AuthorizationService,
    scope: Arc<dyn ResourceScope>,
    repository: Arc<dyn FeeRepository>,
    activity_service: ActivityService,
}

impl FeeService {
    /// Creates a new fee service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        scope: Arc<dyn ResourceScope>,
        repository: Arc<dyn FeeRepository>,
        activity_service: ActivityService,
    ) -> Self {
        Self {
            authorization_service,
            scope,
            repository,
            activity_service,
        }
    }

    /// Lists fees visible to the caller.
    pub async fn list(
        &self,
        caller: &Caller,
        filter: FeeFilter,
        sort: Sort<FeeSortField>,
        page: PageRequest,
    ) -> AppResult<Page<FeeRecord>> {
        AuthorizationService::require_permission(caller, Permission::FeeRead)?;
        let query = ScopedQuery::new(self.scope.predicate_for(caller), filter, sort, page);
        self.repository.list_fees(&query).await
    }

    /// Returns one fee visible to the caller.
    pub async fn get(&self, caller: &Caller, fee_id: FeeId) -> AppResult<FeeRecord> {
        AuthorizationService::require_permission(caller, Permission::FeeRead)?;
        self.find_in_scope(caller, fee_id).await
    }

    /// Creates a pending fee and notifies the student's parent.
    pub async fn create(&self, caller: &Caller, input: FeeInput) -> AppResult<FeeRecord> {
        self.authorization_service
            .authorize_write(caller, Permission::FeeWrite)
            .await?;
        let fee = FeeRecord::new(FeeId::new(), input)?;
        self.repository.insert_fee(&fee).await?;

        info!(caller_id = %caller.id(), fee_id = %fee.id(), "fee created");
        self.activity_service
            .record(caller, ActivityAction::FeeCreated, "fee", fee.id(), None)
            .await;
        self.activity_service
            .notify_parent_of(
                fee.student_id(),
                "New fee issued",
                &format!(
                    "A fee of {} is due on {}.",
                    format_amount(fee.amount_minor()),
                    fee.due_date()
                ),
            )
            .await;
        Ok(fee)
    }

    /// Revises an unsettled fee.
    pub async fn update(
        &self,
        caller: &Caller,
        fee_id: FeeId,
        input: FeeInput,
    ) -> AppResult<FeeRecord> {
        self.authorization_service
            .authorize_write(caller, Permission::FeeWrite)
            .await?;
        let mut fee = self.find_in_scope(caller, fee_id).await?;
        fee.revise(input)?;
        self.repository.update_fee(&fee).await?;

        self.activity_service
            .record(caller, ActivityAction::FeeUpdated, "fee", fee_id, None)
            .await;
        Ok(fee)
    }

    /// Deletes a fee.
    pub async fn delete(&self, caller: &Caller, fee_id: FeeId) -> AppResult<()> {
        self.authorization_service
            .authorize_write(caller, Permission::FeeWrite)
            .await?;
        self.find_in_scope(caller, fee_id).await?;
        self.repository.delete_fee(fee_id).await?;

        self.activity_service
            .record(caller, ActivityAction::FeeDeleted, "fee", fee_id, None)
            .await;
        Ok(())
    }

    /// Settles a fee on `paid_on` and notifies the parent.
    pub async fn mark_paid(
        &self,
        caller: &Caller,
        fee_id: FeeId,
        paid_on: NaiveDate,
    ) -> AppResult<FeeRecord> {
        self.authorization_service
            .authorize_write(caller, Permission::FeeWrite)
            .await?;
        let mut fee = self.find_in_scope(caller, fee_id).await?;
        fee.mark_paid(paid_on)?;
        self.repository.update_fee(&fee).await?;

        self.activity_service
            .record(
                caller,
                ActivityAction::FeePaid,
                "fee",
                fee_id,
                Some(format!("paid_date={paid_on}")),
            )
            .await;
        self.activity_service
            .notify_parent_of(
                fee.student_id(),
                "Payment received",
                &format!("We received {}. Thank you.", format_amount(fee.amount_minor())),
            )
            .await;
        Ok(fee)
    }

    /// Flags every pending fee due before `today` as overdue.
    pub async fn mark_overdue(
        &self,
        caller: &Caller,
        today: NaiveDate,
    ) -> AppResult<Vec<FeeRecord>> {
        self.authorization_service
            .authorize_write(caller, Permission::FeeWrite)
            .await?;
        let changed = self.repository.mark_overdue_fees(today).await?;

        info!(caller_id = %caller.id(), count = changed.len(), "fees marked overdue");
        if !changed.is_empty() {
            self.activity_service
                .record(
                    caller,
                    ActivityAction::FeesMarkedOverdue,
                    "fee",
                    today,
                    Some(format!("count={}", changed.len())),
                )
                .await;
        }
        Ok(changed)
    }

    async fn find_in_scope(&self, caller: &Caller, fee_id: FeeId) -> AppResult<FeeRecord> {
        self.repository
            .find_fee(&self.scope.predicate_for(caller), fee_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("{} '{fee_id}' does not exist", self.scope.resource()))
            })
    }
}

fn format_amount(amount_minor: i64) -> String {
    format!("{}.{:02}", amount_minor / 100, amount_minor % 100)
}

#[cfg(test)]
mod tests;
