use academy_application::{
    BatchQuery, BatchRepository, BatchSortField, Page, ScopePredicate, SortDirection,
};
use academy_core::{AppError, AppResult, Role};
use academy_domain::{Batch, BatchId};
use async_trait::async_trait;

use super::{AcademyTables, InMemoryAcademyRepository, contains_ignore_case, paginate};

#[async_trait]
impl BatchRepository for InMemoryAcademyRepository {
    async fn list_batches(&self, query: &BatchQuery) -> AppResult<Page<Batch>> {
        let tables = self.tables.read().await;
        let filter = query.filter();

        let mut rows: Vec<Batch> = tables
            .batches
            .values()
            .filter(|batch| tables.batch_in_scope(query.scope(), batch))
            .filter(|batch| filter.teacher_id.is_none_or(|id| batch.is_taught_by(id)))
            .filter(|batch| filter.day.is_none_or(|day| batch.days().contains(&day)))
            .filter(|batch| {
                filter
                    .level
                    .as_deref()
                    .is_none_or(|level| batch.level().eq_ignore_ascii_case(level.trim()))
            })
            .filter(|batch| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|search| contains_ignore_case(batch.name(), search))
            })
            .cloned()
            .collect();

        let sort = query.sort();
        rows.sort_by(|left, right| {
            let ordering = match sort.field {
                BatchSortField::Name => left.name().cmp(right.name()),
                BatchSortField::Level => left.level().cmp(right.level()),
                BatchSortField::StartTime => {
                    left.time_slot().start().cmp(&right.time_slot().start())
                }
            }
            .then_with(|| left.id().cmp(&right.id()));
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        Ok(paginate(rows, query.page()))
    }

    async fn find_batch(
        &self,
        scope: &ScopePredicate,
        batch_id: BatchId,
    ) -> AppResult<Option<Batch>> {
        let tables = self.tables.read().await;
        Ok(tables
            .batches
            .get(&batch_id)
            .filter(|batch| tables.batch_in_scope(scope, batch))
            .cloned())
    }

    async fn insert_batch(&self, batch: &Batch) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.batches.contains_key(&batch.id()) {
            return Err(AppError::Conflict(format!(
                "batch '{}' already exists",
                batch.id()
            )));
        }
        ensure_teacher(&tables, batch)?;

        tables.batches.insert(batch.id(), batch.clone());
        Ok(())
    }

    async fn update_batch(&self, batch: &Batch) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.batches.contains_key(&batch.id()) {
            return Err(AppError::NotFound(format!(
                "batch '{}' does not exist",
                batch.id()
            )));
        }
        ensure_teacher(&tables, batch)?;

        tables.batches.insert(batch.id(), batch.clone());
        Ok(())
    }

    async fn delete_batch(&self, batch_id: BatchId) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .attendance
            .keys()
            .any(|key| key.batch_id == batch_id)
        {
            return Err(AppError::Conflict(format!(
                "batch '{batch_id}' has attendance history"
            )));
        }
        if tables.batches.remove(&batch_id).is_none() {
            return Err(AppError::NotFound(format!(
                "batch '{batch_id}' does not exist"
            )));
        }

        let enrolled: Vec<_> = tables
            .students
            .values()
            .filter(|student| student.batch_id() == Some(batch_id))
            .map(|student| student.without_batch())
            .collect();
        for student in enrolled {
            tables.students.insert(student.id(), student);
        }

        Ok(())
    }
}

fn ensure_teacher(tables: &AcademyTables, batch: &Batch) -> AppResult<()> {
    let Some(teacher_id) = batch.teacher_id() else {
        return Ok(());
    };

    match tables.users.get(&teacher_id) {
        Some(account) if account.role() == Role::Teacher => Ok(()),
        _ => Err(AppError::Conflict(format!(
            "teacher '{teacher_id}' does not exist"
        ))),
    }
}
