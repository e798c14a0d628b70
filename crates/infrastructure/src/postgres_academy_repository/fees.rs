use academy_application::{FeeQuery, FeeRepository, FeeSortField, SortDirection};
use async_trait::async_trait;

use super::*;

const FEE_COLUMNS: &str = "f.id, f.student_id, f.amount_minor, f.due_date, f.status, f.paid_date";

fn push_fee_conditions(builder: &mut QueryBuilder<'_, Postgres>, query: &FeeQuery) {
    let filter = query.filter();

    builder.push(" WHERE (");
    push_scope(builder, query.scope(), &FEE_SCOPE);
    builder.push(")");

    if let Some(student_id) = filter.student_id {
        builder.push(" AND f.student_id = ");
        builder.push_bind(student_id.as_uuid());
    }
    if let Some(status) = filter.status {
        builder.push(" AND f.status = ");
        builder.push_bind(status.as_str());
    }
    if let Some(due_from) = filter.due_from {
        builder.push(" AND f.due_date >= ");
        builder.push_bind(due_from);
    }
    if let Some(due_to) = filter.due_to {
        builder.push(" AND f.due_date <= ");
        builder.push_bind(due_to);
    }
}

#[async_trait]
impl FeeRepository for PostgresAcademyRepository {
    async fn list_fees(&self, query: &FeeQuery) -> AppResult<Page<FeeRecord>> {
        let (limit, offset) = page_bounds(query.page())?;
        let mut snapshot = self.read_snapshot().await?;

        let mut count: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) AS total FROM fees f");
        push_fee_conditions(&mut count, query);
        let total = count
            .build_query_as::<CountRow>()
            .fetch_one(&mut *snapshot)
            .await
            .map_err(|error| read_error(error, "count fees"))?
            .total;

        let mut select: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {FEE_COLUMNS} FROM fees f"));
        push_fee_conditions(&mut select, query);
        let sort = query.sort();
        select.push(match sort.field {
            FeeSortField::DueDate => " ORDER BY f.due_date",
            FeeSortField::Amount => " ORDER BY f.amount_minor",
            FeeSortField::Status => " ORDER BY f.status",
        });
        select.push(match sort.direction {
            SortDirection::Asc => " ASC, f.id ASC",
            SortDirection::Desc => " DESC, f.id DESC",
        });
        select.push(" LIMIT ");
        select.push_bind(limit);
        select.push(" OFFSET ");
        select.push_bind(offset);

        let rows = select
            .build_query_as::<FeeRow>()
            .fetch_all(&mut *snapshot)
            .await
            .map_err(|error| read_error(error, "list fees"))?;

        snapshot
            .commit()
            .await
            .map_err(|error| read_error(error, "finish read snapshot"))?;

        page_from_rows(rows, total, query.page(), FeeRecord::try_from)
    }

    async fn find_fee(
        &self,
        scope: &ScopePredicate,
        fee_id: FeeId,
    ) -> AppResult<Option<FeeRecord>> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {FEE_COLUMNS} FROM fees f WHERE f.id = "));
        builder.push_bind(fee_id.as_uuid());
        builder.push(" AND (");
        push_scope(&mut builder, scope, &FEE_SCOPE);
        builder.push(")");

        builder
            .build_query_as::<FeeRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| read_error(error, "find fee"))?
            .map(FeeRecord::try_from)
            .transpose()
    }

    async fn insert_fee(&self, fee: &FeeRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO fees (id, student_id, amount_minor, due_date, status, paid_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(fee.id().as_uuid())
        .bind(fee.student_id().as_uuid())
        .bind(fee.amount_minor())
        .bind(fee.due_date())
        .bind(fee.status().as_str())
        .bind(fee.paid_date())
        .execute(&self.pool)
        .await
        .map_err(|error| write_error(error, "insert fee"))?;

        Ok(())
    }

    async fn update_fee(&self, fee: &FeeRecord) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE fees
            SET student_id = $2, amount_minor = $3, due_date = $4, status = $5, paid_date = $6
            WHERE id = $1
            "#,
        )
        .bind(fee.id().as_uuid())
        .bind(fee.student_id().as_uuid())
        .bind(fee.amount_minor())
        .bind(fee.due_date())
        .bind(fee.status().as_str())
        .bind(fee.paid_date())
        .execute(&self.pool)
        .await
        .map_err(|error| write_error(error, "update fee"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "fee '{}' does not exist",
                fee.id()
            )));
        }
        Ok(())
    }

    async fn delete_fee(&self, fee_id: FeeId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM fees WHERE id = $1")
            .bind(fee_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| write_error(error, "delete fee"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("fee '{fee_id}' does not exist")));
        }
        Ok(())
    }

    async fn mark_overdue_fees(&self, today: NaiveDate) -> AppResult<Vec<FeeRecord>> {
        let rows = sqlx::query_as::<_, FeeRow>(
            r#"
            UPDATE fees AS f
            SET status = 'OVERDUE'
            WHERE f.status = 'PENDING' AND f.due_date < $1
            RETURNING f.id, f.student_id, f.amount_minor, f.due_date, f.status, f.paid_date
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| write_error(error, "mark overdue fees"))?;

        let mut fees = rows
            .into_iter()
            .map(FeeRecord::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        fees.sort_by_key(|fee| (fee.due_date(), fee.id().as_uuid()));
        Ok(fees)
    }
}
