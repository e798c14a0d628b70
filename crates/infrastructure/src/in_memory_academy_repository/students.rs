use academy_application::{
    Page, ScopePredicate, SortDirection, StudentQuery, StudentRepository, StudentSortField,
};
use academy_core::{AppError, AppResult};
use academy_domain::{Student, StudentId, UserAccount};
use async_trait::async_trait;

use super::{AcademyTables, InMemoryAcademyRepository, contains_ignore_case, paginate};

#[async_trait]
impl StudentRepository for InMemoryAcademyRepository {
    async fn list_students(&self, query: &StudentQuery) -> AppResult<Page<Student>> {
        let tables = self.tables.read().await;
        let filter = query.filter();

        let mut rows: Vec<Student> = tables
            .students
            .values()
            .filter(|student| tables.student_in_scope(query.scope(), student))
            .filter(|student| filter.batch_id.is_none_or(|id| student.batch_id() == Some(id)))
            .filter(|student| filter.parent_id.is_none_or(|id| student.parent_id() == id))
            .filter(|student| filter.is_active.is_none_or(|active| student.is_active() == active))
            .filter(|student| {
                filter
                    .level
                    .as_deref()
                    .is_none_or(|level| student.level().eq_ignore_ascii_case(level.trim()))
            })
            .filter(|student| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|search| contains_ignore_case(student.name(), search))
            })
            .cloned()
            .collect();

        let sort = query.sort();
        rows.sort_by(|left, right| {
            let ordering = match sort.field {
                StudentSortField::Name => left.name().cmp(right.name()),
                StudentSortField::Level => left.level().cmp(right.level()),
            }
            .then_with(|| left.id().cmp(&right.id()));
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        Ok(paginate(rows, query.page()))
    }

    async fn find_student(
        &self,
        scope: &ScopePredicate,
        student_id: StudentId,
    ) -> AppResult<Option<Student>> {
        let tables = self.tables.read().await;
        Ok(tables
            .students
            .get(&student_id)
            .filter(|student| tables.student_in_scope(scope, student))
            .cloned())
    }

    async fn insert_student(
        &self,
        student: &Student,
        new_parent: Option<&UserAccount>,
    ) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.students.contains_key(&student.id()) {
            return Err(AppError::Conflict(format!(
                "student '{}' already exists",
                student.id()
            )));
        }
        ensure_references(&tables, student, new_parent)?;

        if let Some(parent) = new_parent {
            tables.users.insert(parent.id(), parent.clone());
        }
        tables.students.insert(student.id(), student.clone());
        Ok(())
    }

    async fn update_student(
        &self,
        student: &Student,
        new_parent: Option<&UserAccount>,
    ) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.students.contains_key(&student.id()) {
            return Err(AppError::NotFound(format!(
                "student '{}' does not exist",
                student.id()
            )));
        }
        ensure_references(&tables, student, new_parent)?;

        if let Some(parent) = new_parent {
            tables.users.insert(parent.id(), parent.clone());
        }
        tables.students.insert(student.id(), student.clone());
        Ok(())
    }

    async fn delete_student(&self, student_id: StudentId) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let has_attendance = tables
            .attendance
            .values()
            .any(|record| record.student_id() == student_id);
        let has_fees = tables
            .fees
            .values()
            .any(|fee| fee.student_id() == student_id);
        if has_attendance || has_fees {
            return Err(AppError::Conflict(format!(
                "student '{student_id}' has attendance or fee history; deactivate instead"
            )));
        }

        match tables.students.remove(&student_id) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!(
                "student '{student_id}' does not exist"
            ))),
        }
    }
}

/// Checks every reference before anything is written.
fn ensure_references(
    tables: &AcademyTables,
    student: &Student,
    new_parent: Option<&UserAccount>,
) -> AppResult<()> {
    if let Some(parent) = new_parent
        && (tables.users.contains_key(&parent.id())
            || tables
                .users
                .values()
                .any(|existing| existing.email() == parent.email()))
    {
        return Err(AppError::Conflict(format!(
            "an account for '{}' already exists",
            parent.email().as_str()
        )));
    }

    let parent_known = new_parent.is_some_and(|parent| parent.id() == student.parent_id())
        || tables.users.contains_key(&student.parent_id());
    if !parent_known {
        return Err(AppError::Conflict(format!(
            "parent '{}' does not exist",
            student.parent_id()
        )));
    }
    if let Some(batch_id) = student.batch_id()
        && !tables.batches.contains_key(&batch_id)
    {
        return Err(AppError::Conflict(format!(
            "batch '{batch_id}' does not exist"
        )));
    }

    Ok(())
}
