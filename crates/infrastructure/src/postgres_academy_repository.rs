//! PostgreSQL-backed academy storage.
//!
//! Every list and lookup pushes the role scope and the caller filter as two
//! separate `AND`ed groups, so a filter can only narrow the scoped row set.

use std::collections::BTreeSet;
use std::str::FromStr;

use academy_application::{Page, PageRequest, ScopePredicate};
use academy_core::{AppError, AppResult, Role, UserId};
use academy_domain::{
    AttendanceKey, AttendanceRecord, AttendanceStatus, Batch, BatchId, BatchInput, DayOfWeek,
    FeeId, FeeInput, FeeRecord, FeeStatus, Student, StudentId, StudentInput, UserAccount,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

mod attendance;
mod batches;
mod fees;
mod students;
mod users;

#[cfg(test)]
mod tests;

/// PostgreSQL implementation of every academy storage port.
#[derive(Clone)]
pub struct PostgresAcademyRepository {
    pool: PgPool,
}

impl PostgresAcademyRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a read-only transaction whose statements share one snapshot, so a
    /// page's total and rows agree under concurrent writes.
    async fn read_snapshot(&self) -> AppResult<Transaction<'static, Postgres>> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| read_error(error, "start read snapshot"))?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *transaction)
            .await
            .map_err(|error| read_error(error, "start read snapshot"))?;
        Ok(transaction)
    }
}

/// SQL fragments that express one resource's ownership edges.
///
/// Each pair wraps a bound user id: `prefix <id> suffix`.
struct ScopeSql {
    teacher: (&'static str, &'static str),
    parent: (&'static str, &'static str),
}

const STUDENT_SCOPE: ScopeSql = ScopeSql {
    teacher: (
        "EXISTS (SELECT 1 FROM batches scope_batch \
         WHERE scope_batch.id = s.batch_id \
         AND scope_batch.teacher_id = ",
        ")",
    ),
    parent: ("s.parent_id = ", ""),
};

const BATCH_SCOPE: ScopeSql = ScopeSql {
    teacher: ("b.teacher_id = ", ""),
    parent: (
        "EXISTS (SELECT 1 FROM students scope_student \
         WHERE scope_student.batch_id = b.id \
         AND scope_student.parent_id = ",
        ")",
    ),
};

const ATTENDANCE_SCOPE: ScopeSql = ScopeSql {
    teacher: (
        "EXISTS (SELECT 1 FROM batches scope_batch \
         WHERE scope_batch.id = a.batch_id \
         AND scope_batch.teacher_id = ",
        ")",
    ),
    parent: (
        "EXISTS (SELECT 1 FROM students scope_student \
         WHERE scope_student.id = a.student_id \
         AND scope_student.parent_id = ",
        ")",
    ),
};

const FEE_SCOPE: ScopeSql = ScopeSql {
    teacher: (
        "EXISTS (SELECT 1 FROM students scope_student \
         JOIN batches scope_batch ON scope_batch.id = scope_student.batch_id \
         WHERE scope_student.id = f.student_id \
         AND scope_batch.teacher_id = ",
        ")",
    ),
    parent: (
        "EXISTS (SELECT 1 FROM students scope_student \
         WHERE scope_student.id = f.student_id \
         AND scope_student.parent_id = ",
        ")",
    ),
};

fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, scope: &ScopePredicate, sql: &ScopeSql) {
    let (fragment, user_id) = match scope {
        ScopePredicate::Unrestricted => {
            builder.push("TRUE");
            return;
        }
        ScopePredicate::TeacherOf(teacher_id) => (sql.teacher, *teacher_id),
        ScopePredicate::ParentOf(parent_id) => (sql.parent, *parent_id),
    };

    builder.push(fragment.0);
    builder.push_bind(user_id.as_uuid());
    builder.push(fragment.1);
}

fn page_bounds(request: PageRequest) -> AppResult<(i64, i64)> {
    let offset = i64::try_from(request.offset())
        .map_err(|error| AppError::Validation(format!("invalid page offset: {error}")))?;
    Ok((i64::from(request.limit()), offset))
}

fn page_from_rows<R, T>(
    rows: Vec<R>,
    total: i64,
    request: PageRequest,
    convert: impl Fn(R) -> AppResult<T>,
) -> AppResult<Page<T>> {
    let data = rows.into_iter().map(convert).collect::<AppResult<Vec<T>>>()?;
    Ok(Page::new(data, u64::try_from(total).unwrap_or_default(), request))
}

/// Maps constraint violations to `Conflict`; everything else is internal.
fn write_error(error: sqlx::Error, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error {
        let conflict = match database_error.code().as_deref() {
            Some("23505") => Some("a row with the same key already exists"),
            Some("23503") => Some("a referenced row is missing or still in use"),
            Some("23514") => Some("a value violates a table constraint"),
            _ => None,
        };
        if let Some(reason) = conflict {
            return AppError::Conflict(format!("failed to {operation}: {reason}"));
        }
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}

fn read_error(error: sqlx::Error, operation: &str) -> AppError {
    AppError::Internal(format!("failed to {operation}: {error}"))
}

#[derive(Debug, FromRow)]
struct CountRow {
    total: i64,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    display_name: String,
    email: String,
    role: String,
}

impl TryFrom<UserRow> for UserAccount {
    type Error = AppError;

    fn try_from(row: UserRow) -> AppResult<Self> {
        let role = Role::from_str(&row.role)?;
        UserAccount::new(UserId::from_uuid(row.id), row.display_name, row.email, role)
    }
}

#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    name: String,
    level: String,
    days: Vec<String>,
    start_time: NaiveTime,
    end_time: NaiveTime,
    teacher_id: Option<Uuid>,
}

impl TryFrom<BatchRow> for Batch {
    type Error = AppError;

    fn try_from(row: BatchRow) -> AppResult<Self> {
        let days = row
            .days
            .iter()
            .map(|day| DayOfWeek::from_str(day))
            .collect::<AppResult<BTreeSet<_>>>()?;

        Batch::new(
            BatchId::from_uuid(row.id),
            BatchInput {
                name: row.name,
                level: row.level,
                days,
                start_time: row.start_time,
                end_time: row.end_time,
                teacher_id: row.teacher_id.map(UserId::from_uuid),
            },
        )
    }
}

#[derive(Debug, FromRow)]
struct StudentRow {
    id: Uuid,
    name: String,
    level: String,
    is_active: bool,
    parent_id: Uuid,
    batch_id: Option<Uuid>,
}

impl TryFrom<StudentRow> for Student {
    type Error = AppError;

    fn try_from(row: StudentRow) -> AppResult<Self> {
        Student::new(
            StudentId::from_uuid(row.id),
            StudentInput {
                name: row.name,
                level: row.level,
                is_active: row.is_active,
                parent_id: UserId::from_uuid(row.parent_id),
                batch_id: row.batch_id.map(BatchId::from_uuid),
            },
        )
    }
}

#[derive(Debug, FromRow)]
struct FeeRow {
    id: Uuid,
    student_id: Uuid,
    amount_minor: i64,
    due_date: NaiveDate,
    status: String,
    paid_date: Option<NaiveDate>,
}

impl TryFrom<FeeRow> for FeeRecord {
    type Error = AppError;

    fn try_from(row: FeeRow) -> AppResult<Self> {
        FeeRecord::from_storage(
            FeeId::from_uuid(row.id),
            FeeInput {
                student_id: StudentId::from_uuid(row.student_id),
                amount_minor: row.amount_minor,
                due_date: row.due_date,
            },
            FeeStatus::from_str(&row.status)?,
            row.paid_date,
        )
    }
}

#[derive(Debug, FromRow)]
struct AttendanceRow {
    date: NaiveDate,
    student_id: Uuid,
    batch_id: Uuid,
    status: String,
    marked_by: Uuid,
    marked_at: DateTime<Utc>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = AppError;

    fn try_from(row: AttendanceRow) -> AppResult<Self> {
        Ok(AttendanceRecord::new(
            AttendanceKey {
                date: row.date,
                student_id: StudentId::from_uuid(row.student_id),
                batch_id: BatchId::from_uuid(row.batch_id),
            },
            AttendanceStatus::from_str(&row.status)?,
            UserId::from_uuid(row.marked_by),
            row.marked_at,
        ))
    }
}
