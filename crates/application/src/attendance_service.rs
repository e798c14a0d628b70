//! Attendance ledger access: scoped reads plus single and bulk marking.

use std::collections::BTreeSet;
use std::sync::Arc;

use academy_core::{AppError, AppResult, Caller, Role};
use academy_domain::{
    ActivityAction, AttendanceEntry, AttendanceKey, AttendanceRecord, AttendanceStatus, Batch,
    BatchId, Permission, StudentId,
};
use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::{
    ActivityService, AttendanceFilter, AttendanceLedger, AttendanceSortField,
    AuthorizationService, BatchRepository, Page, PageRequest, ResourceScope, ScopePredicate,
    ScopedQuery, Sort,
};

/// Application service for the attendance ledger.
#[derive(Clone)]
pub struct AttendanceService {
    authorization_service: AuthorizationService,
    scope: Arc<dyn ResourceScope>,
    ledger: Arc<dyn AttendanceLedger>,
    batch_repository: Arc<dyn BatchRepository>,
    activity_service: ActivityService,
}

impl AttendanceService {
    /// Creates a new attendance service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        scope: Arc<dyn ResourceScope>,
        ledger: Arc<dyn AttendanceLedger>,
        batch_repository: Arc<dyn BatchRepository>,
        activity_service: ActivityService,
    ) -> Self {
        Self {
            authorization_service,
            scope,
            ledger,
            batch_repository,
            activity_service,
        }
    }

    /// Lists attendance records visible to the caller.
    pub async fn list(
        &self,
        caller: &Caller,
        filter: AttendanceFilter,
        sort: Sort<AttendanceSortField>,
        page: PageRequest,
    ) -> AppResult<Page<AttendanceRecord>> {
        AuthorizationService::require_permission(caller, Permission::AttendanceRead)?;
        if filter.has_inverted_range() {
            return Err(AppError::Validation(
                "date_from must not be after date_to".to_owned(),
            ));
        }

        let query = ScopedQuery::new(self.scope.predicate_for(caller), filter, sort, page);
        self.ledger.list_attendance(&query).await
    }

    /// Records one student's status. Marking the same status twice is a no-op.
    pub async fn mark_one(
        &self,
        caller: &Caller,
        batch_id: BatchId,
        date: NaiveDate,
        student_id: StudentId,
        status: AttendanceStatus,
    ) -> AppResult<AttendanceRecord> {
        AuthorizationService::require_permission(caller, Permission::MarkAttendance)?;
        self.authorization_service
            .check_write_rate_limit(caller)
            .await?;
        self.load_owned_batch(caller, batch_id).await?;

        let record = AttendanceRecord::new(
            AttendanceKey {
                date,
                student_id,
                batch_id,
            },
            status,
            caller.id(),
            Utc::now(),
        );
        let stored = self.ledger.upsert_record(&record).await?;

        self.after_marking(caller, batch_id, date, std::slice::from_ref(&stored))
            .await;
        Ok(stored)
    }

    /// Records a whole class in one transaction.
    ///
    /// Either every entry is stored or none is. An empty list succeeds without
    /// touching storage.
    pub async fn mark_bulk(
        &self,
        caller: &Caller,
        batch_id: BatchId,
        date: NaiveDate,
        entries: Vec<AttendanceEntry>,
    ) -> AppResult<Vec<AttendanceRecord>> {
        AuthorizationService::require_permission(caller, Permission::MarkAttendance)?;
        reject_duplicate_students(&entries)?;
        self.authorization_service
            .check_write_rate_limit(caller)
            .await?;
        self.load_owned_batch(caller, batch_id).await?;

        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let marked_at = Utc::now();
        let records: Vec<AttendanceRecord> = entries
            .iter()
            .map(|entry| {
                AttendanceRecord::new(
                    AttendanceKey {
                        date,
                        student_id: entry.student_id,
                        batch_id,
                    },
                    entry.status,
                    caller.id(),
                    marked_at,
                )
            })
            .collect();
        let stored = self.ledger.upsert_records(&records).await?;

        self.after_marking(caller, batch_id, date, &stored).await;
        Ok(stored)
    }

    async fn load_owned_batch(&self, caller: &Caller, batch_id: BatchId) -> AppResult<Batch> {
        let batch = self
            .batch_repository
            .find_batch(&ScopePredicate::Unrestricted, batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("batch '{batch_id}' does not exist")))?;

        // An unassigned batch can only be marked by an admin.
        let owned = match batch.teacher_id() {
            Some(teacher_id) => AuthorizationService::is_owner(caller, teacher_id),
            None => caller.role() == Role::Admin,
        };
        if !owned {
            return Err(AppError::Forbidden(format!(
                "caller '{}' does not teach batch '{batch_id}'",
                caller.id()
            )));
        }

        Ok(batch)
    }

    async fn after_marking(
        &self,
        caller: &Caller,
        batch_id: BatchId,
        date: NaiveDate,
        stored: &[AttendanceRecord],
    ) {
        info!(
            caller_id = %caller.id(),
            batch_id = %batch_id,
            date = %date,
            count = stored.len(),
            "attendance marked"
        );
        self.activity_service
            .record(
                caller,
                ActivityAction::AttendanceMarked,
                "batch",
                batch_id,
                Some(format!("date={date} count={}", stored.len())),
            )
            .await;

        for record in stored
            .iter()
            .filter(|record| record.status() == AttendanceStatus::Absent)
        {
            self.activity_service
                .notify_parent_of(
                    record.student_id(),
                    "Absence recorded",
                    &format!("Your child was marked absent on {date}."),
                )
                .await;
        }
    }
}

fn reject_duplicate_students(entries: &[AttendanceEntry]) -> AppResult<()> {
    let mut seen = BTreeSet::new();
    for entry in entries {
        if !seen.insert(entry.student_id) {
            return Err(AppError::Validation(format!(
                "student '{}' appears more than once",
                entry.student_id
            )));
        }
    }

    Ok(())
}
