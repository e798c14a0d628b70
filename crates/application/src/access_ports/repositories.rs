use async_trait::async_trait;
use chrono::NaiveDate;

use academy_core::{AppResult, UserId};
use academy_domain::{
    AttendanceRecord, Batch, BatchId, EmailAddress, FeeId, FeeRecord, Student, StudentId,
    UserAccount,
};

use crate::ScopePredicate;
use crate::access_ports::query::{AttendanceQuery, BatchQuery, FeeQuery, Page, StudentQuery};

/// Storage port for students.
///
/// Every lookup takes the caller's scope; a row outside it reads as absent.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Lists students matching `scope AND filter`.
    async fn list_students(&self, query: &StudentQuery) -> AppResult<Page<Student>>;

    /// Finds one student inside the scope.
    async fn find_student(
        &self,
        scope: &ScopePredicate,
        student_id: StudentId,
    ) -> AppResult<Option<Student>>;

    /// Inserts a student. Unknown parent or batch references are conflicts.
    ///
    /// A `new_parent` account is created in the same transaction; a taken
    /// email or any failure on the student row leaves neither row written.
    async fn insert_student(
        &self,
        student: &Student,
        new_parent: Option<&UserAccount>,
    ) -> AppResult<()>;

    /// Replaces a stored student, creating `new_parent` alongside it.
    async fn update_student(
        &self,
        student: &Student,
        new_parent: Option<&UserAccount>,
    ) -> AppResult<()>;

    /// Deletes a student. Students with attendance or fee history are conflicts.
    async fn delete_student(&self, student_id: StudentId) -> AppResult<()>;
}

/// Storage port for batches.
#[async_trait]
pub trait BatchRepository: Send + Sync {
    /// Lists batches matching `scope AND filter`.
    async fn list_batches(&self, query: &BatchQuery) -> AppResult<Page<Batch>>;

    /// Finds one batch inside the scope.
    async fn find_batch(
        &self,
        scope: &ScopePredicate,
        batch_id: BatchId,
    ) -> AppResult<Option<Batch>>;

    /// Inserts a batch.
    async fn insert_batch(&self, batch: &Batch) -> AppResult<()>;

    /// Replaces a stored batch.
    async fn update_batch(&self, batch: &Batch) -> AppResult<()>;

    /// Deletes a batch and unassigns its students.
    ///
    /// Batches with attendance history are conflicts.
    async fn delete_batch(&self, batch_id: BatchId) -> AppResult<()>;
}

/// Storage port for fee records.
#[async_trait]
pub trait FeeRepository: Send + Sync {
    /// Lists fees matching `scope AND filter`.
    async fn list_fees(&self, query: &FeeQuery) -> AppResult<Page<FeeRecord>>;

    /// Finds one fee inside the scope.
    async fn find_fee(&self, scope: &ScopePredicate, fee_id: FeeId)
    -> AppResult<Option<FeeRecord>>;

    /// Inserts a fee. An unknown student is a conflict.
    async fn insert_fee(&self, fee: &FeeRecord) -> AppResult<()>;

    /// Replaces a stored fee.
    async fn update_fee(&self, fee: &FeeRecord) -> AppResult<()>;

    /// Deletes a fee.
    async fn delete_fee(&self, fee_id: FeeId) -> AppResult<()>;

    /// Flags every pending fee due before `today` as overdue.
    ///
    /// Returns the fees that changed.
    async fn mark_overdue_fees(&self, today: NaiveDate) -> AppResult<Vec<FeeRecord>>;
}

/// Attendance ledger keyed by `(date, student_id, batch_id)`.
#[async_trait]
pub trait AttendanceLedger: Send + Sync {
    /// Lists records matching `scope AND filter`.
    async fn list_attendance(&self, query: &AttendanceQuery)
    -> AppResult<Page<AttendanceRecord>>;

    /// Inserts or overwrites one record and returns the stored row.
    async fn upsert_record(&self, record: &AttendanceRecord) -> AppResult<AttendanceRecord>;

    /// Upserts all records in one transaction. Any failure leaves no rows written.
    async fn upsert_records(&self, records: &[AttendanceRecord])
    -> AppResult<Vec<AttendanceRecord>>;
}

/// Storage port for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds an account by id.
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>>;

    /// Finds an account by normalized email.
    async fn find_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<UserAccount>>;

    /// Inserts an account. A duplicate email is a conflict.
    async fn insert_user(&self, account: &UserAccount) -> AppResult<()>;
}
