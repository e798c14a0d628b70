use std::collections::BTreeMap;

use academy_application::{
    AttendanceLedger, AttendanceQuery, AttendanceSortField, Page, SortDirection,
};
use academy_core::{AppError, AppResult};
use academy_domain::{AttendanceKey, AttendanceRecord};
use async_trait::async_trait;

use super::{AcademyTables, InMemoryAcademyRepository, paginate};

#[async_trait]
impl AttendanceLedger for InMemoryAcademyRepository {
    async fn list_attendance(
        &self,
        query: &AttendanceQuery,
    ) -> AppResult<Page<AttendanceRecord>> {
        let tables = self.tables.read().await;
        let filter = query.filter();

        let mut rows: Vec<AttendanceRecord> = tables
            .attendance
            .values()
            .filter(|record| tables.record_in_scope(query.scope(), record))
            .filter(|record| filter.batch_id.is_none_or(|id| record.batch_id() == id))
            .filter(|record| filter.student_id.is_none_or(|id| record.student_id() == id))
            .filter(|record| filter.status.is_none_or(|status| record.status() == status))
            .filter(|record| filter.date_from.is_none_or(|from| record.date() >= from))
            .filter(|record| filter.date_to.is_none_or(|to| record.date() <= to))
            .cloned()
            .collect();

        let sort = query.sort();
        rows.sort_by(|left, right| {
            let ordering = match sort.field {
                AttendanceSortField::Date => left.date().cmp(&right.date()),
                AttendanceSortField::Status => {
                    left.status().as_str().cmp(right.status().as_str())
                }
            }
            .then_with(|| left.key().cmp(&right.key()));
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        Ok(paginate(rows, query.page()))
    }

    async fn upsert_record(&self, record: &AttendanceRecord) -> AppResult<AttendanceRecord> {
        let mut tables = self.tables.write().await;
        ensure_references(&tables, record)?;
        Ok(upsert_row(&mut tables.attendance, record))
    }

    async fn upsert_records(
        &self,
        records: &[AttendanceRecord],
    ) -> AppResult<Vec<AttendanceRecord>> {
        let mut tables = self.tables.write().await;

        // Applying a row cannot fail once every reference resolves.
        for record in records {
            ensure_references(&tables, record)?;
        }
        Ok(records
            .iter()
            .map(|record| upsert_row(&mut tables.attendance, record))
            .collect())
    }
}

fn ensure_references(tables: &AcademyTables, record: &AttendanceRecord) -> AppResult<()> {
    if !tables.students.contains_key(&record.student_id()) {
        return Err(AppError::Conflict(format!(
            "student '{}' does not exist",
            record.student_id()
        )));
    }
    if !tables.batches.contains_key(&record.batch_id()) {
        return Err(AppError::Conflict(format!(
            "batch '{}' does not exist",
            record.batch_id()
        )));
    }

    Ok(())
}

/// Inserts the row, or re-marks it when the status differs.
fn upsert_row(
    ledger: &mut BTreeMap<AttendanceKey, AttendanceRecord>,
    record: &AttendanceRecord,
) -> AttendanceRecord {
    ledger
        .entry(record.key())
        .and_modify(|existing| {
            if existing.status() != record.status() {
                existing.remark(record.status(), record.marked_by(), record.marked_at());
            }
        })
        .or_insert_with(|| record.clone())
        .clone()
}
