use academy_application::{SortDirection, StudentQuery, StudentRepository, StudentSortField};
use async_trait::async_trait;

use super::users::insert_account;
use super::*;

const STUDENT_COLUMNS: &str = "s.id, s.name, s.level, s.is_active, s.parent_id, s.batch_id";

fn push_student_conditions<'q>(builder: &mut QueryBuilder<'q, Postgres>, query: &'q StudentQuery) {
    let filter = query.filter();

    builder.push(" WHERE (");
    push_scope(builder, query.scope(), &STUDENT_SCOPE);
    builder.push(")");

    if let Some(batch_id) = filter.batch_id {
        builder.push(" AND s.batch_id = ");
        builder.push_bind(batch_id.as_uuid());
    }
    if let Some(parent_id) = filter.parent_id {
        builder.push(" AND s.parent_id = ");
        builder.push_bind(parent_id.as_uuid());
    }
    if let Some(is_active) = filter.is_active {
        builder.push(" AND s.is_active = ");
        builder.push_bind(is_active);
    }
    if let Some(level) = filter.level.as_deref() {
        builder.push(" AND lower(s.level) = lower(");
        builder.push_bind(level.trim());
        builder.push(")");
    }
    if let Some(search) = filter.search.as_deref() {
        builder.push(" AND s.name ILIKE ");
        builder.push_bind(format!("%{}%", escape_like(search.trim())));
    }
}

pub(super) fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl StudentRepository for PostgresAcademyRepository {
    async fn list_students(&self, query: &StudentQuery) -> AppResult<Page<Student>> {
        let (limit, offset) = page_bounds(query.page())?;
        let mut snapshot = self.read_snapshot().await?;

        let mut count: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) AS total FROM students s");
        push_student_conditions(&mut count, query);
        let total = count
            .build_query_as::<CountRow>()
            .fetch_one(&mut *snapshot)
            .await
            .map_err(|error| read_error(error, "count students"))?
            .total;

        let mut select: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {STUDENT_COLUMNS} FROM students s"));
        push_student_conditions(&mut select, query);
        let sort = query.sort();
        select.push(match sort.field {
            StudentSortField::Name => " ORDER BY s.name",
            StudentSortField::Level => " ORDER BY s.level",
        });
        select.push(match sort.direction {
            SortDirection::Asc => " ASC, s.id ASC",
            SortDirection::Desc => " DESC, s.id DESC",
        });
        select.push(" LIMIT ");
        select.push_bind(limit);
        select.push(" OFFSET ");
        select.push_bind(offset);

        let rows = select
            .build_query_as::<StudentRow>()
            .fetch_all(&mut *snapshot)
            .await
            .map_err(|error| read_error(error, "list students"))?;

        snapshot
            .commit()
            .await
            .map_err(|error| read_error(error, "finish read snapshot"))?;

        page_from_rows(rows, total, query.page(), Student::try_from)
    }

    async fn find_student(
        &self,
        scope: &ScopePredicate,
        student_id: StudentId,
    ) -> AppResult<Option<Student>> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {STUDENT_COLUMNS} FROM students s WHERE s.id = "));
        builder.push_bind(student_id.as_uuid());
        builder.push(" AND (");
        push_scope(&mut builder, scope, &STUDENT_SCOPE);
        builder.push(")");

        builder
            .build_query_as::<StudentRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| read_error(error, "find student"))?
            .map(Student::try_from)
            .transpose()
    }

    async fn insert_student(
        &self,
        student: &Student,
        new_parent: Option<&UserAccount>,
    ) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| read_error(error, "start student transaction"))?;

        // Dropping the transaction on error discards the parent row too.
        if let Some(parent) = new_parent {
            insert_account(&mut *transaction, parent).await?;
        }
        sqlx::query(
            r#"
            INSERT INTO students (id, name, level, is_active, parent_id, batch_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(student.id().as_uuid())
        .bind(student.name())
        .bind(student.level())
        .bind(student.is_active())
        .bind(student.parent_id().as_uuid())
        .bind(student.batch_id().map(|batch_id| batch_id.as_uuid()))
        .execute(&mut *transaction)
        .await
        .map_err(|error| write_error(error, "insert student"))?;

        transaction
            .commit()
            .await
            .map_err(|error| write_error(error, "commit student transaction"))
    }

    async fn update_student(
        &self,
        student: &Student,
        new_parent: Option<&UserAccount>,
    ) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| read_error(error, "start student transaction"))?;

        if let Some(parent) = new_parent {
            insert_account(&mut *transaction, parent).await?;
        }
        let result = sqlx::query(
            r#"
            UPDATE students
            SET name = $2, level = $3, is_active = $4, parent_id = $5, batch_id = $6
            WHERE id = $1
            "#,
        )
        .bind(student.id().as_uuid())
        .bind(student.name())
        .bind(student.level())
        .bind(student.is_active())
        .bind(student.parent_id().as_uuid())
        .bind(student.batch_id().map(|batch_id| batch_id.as_uuid()))
        .execute(&mut *transaction)
        .await
        .map_err(|error| write_error(error, "update student"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "student '{}' does not exist",
                student.id()
            )));
        }
        transaction
            .commit()
            .await
            .map_err(|error| write_error(error, "commit student transaction"))
    }

    async fn delete_student(&self, student_id: StudentId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(student_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| write_error(error, "delete student"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "student '{student_id}' does not exist"
            )));
        }
        Ok(())
    }
}
