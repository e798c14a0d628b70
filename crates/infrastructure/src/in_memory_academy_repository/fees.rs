use academy_application::{
    FeeQuery, FeeRepository, FeeSortField, Page, ScopePredicate, SortDirection,
};
use academy_core::{AppError, AppResult};
use academy_domain::{FeeId, FeeRecord};
use async_trait::async_trait;
use chrono::NaiveDate;

use super::{InMemoryAcademyRepository, paginate};

#[async_trait]
impl FeeRepository for InMemoryAcademyRepository {
    async fn list_fees(&self, query: &FeeQuery) -> AppResult<Page<FeeRecord>> {
        let tables = self.tables.read().await;
        let filter = query.filter();

        let mut rows: Vec<FeeRecord> = tables
            .fees
            .values()
            .filter(|fee| tables.fee_in_scope(query.scope(), fee))
            .filter(|fee| filter.student_id.is_none_or(|id| fee.student_id() == id))
            .filter(|fee| filter.status.is_none_or(|status| fee.status() == status))
            .filter(|fee| filter.due_from.is_none_or(|from| fee.due_date() >= from))
            .filter(|fee| filter.due_to.is_none_or(|to| fee.due_date() <= to))
            .cloned()
            .collect();

        let sort = query.sort();
        rows.sort_by(|left, right| {
            let ordering = match sort.field {
                FeeSortField::DueDate => left.due_date().cmp(&right.due_date()),
                FeeSortField::Amount => left.amount_minor().cmp(&right.amount_minor()),
                FeeSortField::Status => left.status().as_str().cmp(right.status().as_str()),
            }
            .then_with(|| left.id().cmp(&right.id()));
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        Ok(paginate(rows, query.page()))
    }

    async fn find_fee(
        &self,
        scope: &ScopePredicate,
        fee_id: FeeId,
    ) -> AppResult<Option<FeeRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .fees
            .get(&fee_id)
            .filter(|fee| tables.fee_in_scope(scope, fee))
            .cloned())
    }

    async fn insert_fee(&self, fee: &FeeRecord) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.students.contains_key(&fee.student_id()) {
            return Err(AppError::Conflict(format!(
                "student '{}' does not exist",
                fee.student_id()
            )));
        }
        if tables.fees.contains_key(&fee.id()) {
            return Err(AppError::Conflict(format!("fee '{}' already exists", fee.id())));
        }

        tables.fees.insert(fee.id(), fee.clone());
        Ok(())
    }

    async fn update_fee(&self, fee: &FeeRecord) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.students.contains_key(&fee.student_id()) {
            return Err(AppError::Conflict(format!(
                "student '{}' does not exist",
                fee.student_id()
            )));
        }
        match tables.fees.get_mut(&fee.id()) {
            Some(stored) => {
                *stored = fee.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("fee '{}' does not exist", fee.id()))),
        }
    }

    async fn delete_fee(&self, fee_id: FeeId) -> AppResult<()> {
        match self.tables.write().await.fees.remove(&fee_id) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("fee '{fee_id}' does not exist"))),
        }
    }

    async fn mark_overdue_fees(&self, today: NaiveDate) -> AppResult<Vec<FeeRecord>> {
        let mut tables = self.tables.write().await;
        let mut changed: Vec<FeeRecord> = tables
            .fees
            .values_mut()
            .filter_map(|fee| fee.mark_overdue_if_due(today).then(|| fee.clone()))
            .collect();
        changed.sort_by_key(|fee| (fee.due_date(), fee.id()));

        Ok(changed)
    }
}
