use academy_application::{BatchQuery, BatchRepository, BatchSortField, SortDirection};
use async_trait::async_trait;

use super::students::escape_like;
use super::*;

const BATCH_COLUMNS: &str = "b.id, b.name, b.level, b.days, b.start_time, b.end_time, b.teacher_id";

fn push_batch_conditions<'q>(builder: &mut QueryBuilder<'q, Postgres>, query: &'q BatchQuery) {
    let filter = query.filter();

    builder.push(" WHERE (");
    push_scope(builder, query.scope(), &BATCH_SCOPE);
    builder.push(")");

    if let Some(teacher_id) = filter.teacher_id {
        builder.push(" AND b.teacher_id = ");
        builder.push_bind(teacher_id.as_uuid());
    }
    if let Some(level) = filter.level.as_deref() {
        builder.push(" AND lower(b.level) = lower(");
        builder.push_bind(level.trim());
        builder.push(")");
    }
    if let Some(day) = filter.day {
        builder.push(" AND ");
        builder.push_bind(day.as_str());
        builder.push(" = ANY(b.days)");
    }
    if let Some(search) = filter.search.as_deref() {
        builder.push(" AND b.name ILIKE ");
        builder.push_bind(format!("%{}%", escape_like(search.trim())));
    }
}

fn day_values(batch: &Batch) -> Vec<String> {
    batch.days().iter().map(|day| day.as_str().to_owned()).collect()
}

impl PostgresAcademyRepository {
    async fn ensure_teacher(&self, batch: &Batch) -> AppResult<()> {
        let Some(teacher_id) = batch.teacher_id() else {
            return Ok(());
        };

        let role = sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1")
            .bind(teacher_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| read_error(error, "load batch teacher"))?;

        match role.as_deref() {
            Some(role) if role == Role::Teacher.as_str() => Ok(()),
            Some(_) => Err(AppError::Conflict(format!(
                "user '{teacher_id}' is not a teacher"
            ))),
            None => Err(AppError::Conflict(format!(
                "teacher '{teacher_id}' does not exist"
            ))),
        }
    }
}

#[async_trait]
impl BatchRepository for PostgresAcademyRepository {
    async fn list_batches(&self, query: &BatchQuery) -> AppResult<Page<Batch>> {
        let (limit, offset) = page_bounds(query.page())?;
        let mut snapshot = self.read_snapshot().await?;

        let mut count: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) AS total FROM batches b");
        push_batch_conditions(&mut count, query);
        let total = count
            .build_query_as::<CountRow>()
            .fetch_one(&mut *snapshot)
            .await
            .map_err(|error| read_error(error, "count batches"))?
            .total;

        let mut select: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {BATCH_COLUMNS} FROM batches b"));
        push_batch_conditions(&mut select, query);
        let sort = query.sort();
        select.push(match sort.field {
            BatchSortField::Name => " ORDER BY b.name",
            BatchSortField::Level => " ORDER BY b.level",
            BatchSortField::StartTime => " ORDER BY b.start_time",
        });
        select.push(match sort.direction {
            SortDirection::Asc => " ASC, b.id ASC",
            SortDirection::Desc => " DESC, b.id DESC",
        });
        select.push(" LIMIT ");
        select.push_bind(limit);
        select.push(" OFFSET ");
        select.push_bind(offset);

        let rows = select
            .build_query_as::<BatchRow>()
            .fetch_all(&mut *snapshot)
            .await
            .map_err(|error| read_error(error, "list batches"))?;

        snapshot
            .commit()
            .await
            .map_err(|error| read_error(error, "finish read snapshot"))?;

        page_from_rows(rows, total, query.page(), Batch::try_from)
    }

    async fn find_batch(
        &self,
        scope: &ScopePredicate,
        batch_id: BatchId,
    ) -> AppResult<Option<Batch>> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {BATCH_COLUMNS} FROM batches b WHERE b.id = "));
        builder.push_bind(batch_id.as_uuid());
        builder.push(" AND (");
        push_scope(&mut builder, scope, &BATCH_SCOPE);
        builder.push(")");

        builder
            .build_query_as::<BatchRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| read_error(error, "find batch"))?
            .map(Batch::try_from)
            .transpose()
    }

    async fn insert_batch(&self, batch: &Batch) -> AppResult<()> {
        self.ensure_teacher(batch).await?;
        sqlx::query(
            r#"
            INSERT INTO batches (id, name, level, days, start_time, end_time, teacher_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(batch.id().as_uuid())
        .bind(batch.name())
        .bind(batch.level())
        .bind(day_values(batch))
        .bind(batch.time_slot().start())
        .bind(batch.time_slot().end())
        .bind(batch.teacher_id().map(|teacher_id| teacher_id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| write_error(error, "insert batch"))?;

        Ok(())
    }

    async fn update_batch(&self, batch: &Batch) -> AppResult<()> {
        self.ensure_teacher(batch).await?;
        let result = sqlx::query(
            r#"
            UPDATE batches
            SET name = $2, level = $3, days = $4, start_time = $5, end_time = $6, teacher_id = $7
            WHERE id = $1
            "#,
        )
        .bind(batch.id().as_uuid())
        .bind(batch.name())
        .bind(batch.level())
        .bind(day_values(batch))
        .bind(batch.time_slot().start())
        .bind(batch.time_slot().end())
        .bind(batch.teacher_id().map(|teacher_id| teacher_id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| write_error(error, "update batch"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "batch '{}' does not exist",
                batch.id()
            )));
        }
        Ok(())
    }

    async fn delete_batch(&self, batch_id: BatchId) -> AppResult<()> {
        // students.batch_id is ON DELETE SET NULL; attendance rows restrict.
        let result = sqlx::query("DELETE FROM batches WHERE id = $1")
            .bind(batch_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| write_error(error, "delete batch"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "batch '{batch_id}' does not exist"
            )));
        }
        Ok(())
    }
}
