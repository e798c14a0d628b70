use academy_application::{
    AttendanceLedger, AttendanceQuery, AttendanceSortField, SortDirection,
};
use async_trait::async_trait;
use sqlx::PgConnection;

use super::*;

const ATTENDANCE_COLUMNS: &str =
    "a.date, a.student_id, a.batch_id, a.status, a.marked_by, a.marked_at";

fn push_attendance_conditions(builder: &mut QueryBuilder<'_, Postgres>, query: &AttendanceQuery) {
    let filter = query.filter();

    builder.push(" WHERE (");
    push_scope(builder, query.scope(), &ATTENDANCE_SCOPE);
    builder.push(")");

    if let Some(batch_id) = filter.batch_id {
        builder.push(" AND a.batch_id = ");
        builder.push_bind(batch_id.as_uuid());
    }
    if let Some(student_id) = filter.student_id {
        builder.push(" AND a.student_id = ");
        builder.push_bind(student_id.as_uuid());
    }
    if let Some(status) = filter.status {
        builder.push(" AND a.status = ");
        builder.push_bind(status.as_str());
    }
    if let Some(date_from) = filter.date_from {
        builder.push(" AND a.date >= ");
        builder.push_bind(date_from);
    }
    if let Some(date_to) = filter.date_to {
        builder.push(" AND a.date <= ");
        builder.push_bind(date_to);
    }
}

/// Writes one ledger row and reads back what is stored.
///
/// An existing row is only touched when the status differs, so re-marking
/// with the same status keeps the original marker and timestamp.
async fn upsert_row(
    connection: &mut PgConnection,
    record: &AttendanceRecord,
) -> AppResult<AttendanceRecord> {
    sqlx::query(
        r#"
        INSERT INTO attendance_records (date, student_id, batch_id, status, marked_by, marked_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (date, student_id, batch_id) DO UPDATE
        SET status = EXCLUDED.status,
            marked_by = EXCLUDED.marked_by,
            marked_at = EXCLUDED.marked_at
        WHERE attendance_records.status IS DISTINCT FROM EXCLUDED.status
        "#,
    )
    .bind(record.date())
    .bind(record.student_id().as_uuid())
    .bind(record.batch_id().as_uuid())
    .bind(record.status().as_str())
    .bind(record.marked_by().as_uuid())
    .bind(record.marked_at())
    .execute(&mut *connection)
    .await
    .map_err(|error| write_error(error, "upsert attendance record"))?;

    let row = sqlx::query_as::<_, AttendanceRow>(
        r#"
        SELECT date, student_id, batch_id, status, marked_by, marked_at
        FROM attendance_records
        WHERE date = $1 AND student_id = $2 AND batch_id = $3
        "#,
    )
    .bind(record.date())
    .bind(record.student_id().as_uuid())
    .bind(record.batch_id().as_uuid())
    .fetch_one(&mut *connection)
    .await
    .map_err(|error| read_error(error, "load attendance record"))?;

    AttendanceRecord::try_from(row)
}

#[async_trait]
impl AttendanceLedger for PostgresAcademyRepository {
    async fn list_attendance(
        &self,
        query: &AttendanceQuery,
    ) -> AppResult<Page<AttendanceRecord>> {
        let (limit, offset) = page_bounds(query.page())?;
        let mut snapshot = self.read_snapshot().await?;

        let mut count: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) AS total FROM attendance_records a");
        push_attendance_conditions(&mut count, query);
        let total = count
            .build_query_as::<CountRow>()
            .fetch_one(&mut *snapshot)
            .await
            .map_err(|error| read_error(error, "count attendance records"))?
            .total;

        let mut select: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records a"
        ));
        push_attendance_conditions(&mut select, query);
        let sort = query.sort();
        let direction = match sort.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        match sort.field {
            AttendanceSortField::Date => select.push(format!(" ORDER BY a.date {direction}")),
            AttendanceSortField::Status => select.push(format!(" ORDER BY a.status {direction}")),
        };
        select.push(format!(
            ", a.student_id {direction}, a.batch_id {direction} LIMIT "
        ));
        select.push_bind(limit);
        select.push(" OFFSET ");
        select.push_bind(offset);

        let rows = select
            .build_query_as::<AttendanceRow>()
            .fetch_all(&mut *snapshot)
            .await
            .map_err(|error| read_error(error, "list attendance records"))?;

        snapshot
            .commit()
            .await
            .map_err(|error| read_error(error, "finish read snapshot"))?;

        page_from_rows(rows, total, query.page(), AttendanceRecord::try_from)
    }

    async fn upsert_record(&self, record: &AttendanceRecord) -> AppResult<AttendanceRecord> {
        let mut connection = self
            .pool
            .acquire()
            .await
            .map_err(|error| read_error(error, "acquire attendance connection"))?;

        upsert_row(&mut *connection, record).await
    }

    async fn upsert_records(
        &self,
        records: &[AttendanceRecord],
    ) -> AppResult<Vec<AttendanceRecord>> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| read_error(error, "start attendance transaction"))?;

        let mut stored = Vec::with_capacity(records.len());
        for record in records {
            // Dropping the transaction on error rolls every row back.
            stored.push(upsert_row(&mut *transaction, record).await?);
        }

        transaction
            .commit()
            .await
            .map_err(|error| write_error(error, "commit attendance transaction"))?;

        Ok(stored)
    }
}
