use std::str::FromStr;

use academy_application::{AttendanceFilter, AttendanceSortField, PageRequest, Sort};
use academy_core::AppResult;
use academy_domain::{AttendanceEntry, AttendanceRecord, AttendanceStatus, BatchId, StudentId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::{parse_date, parse_field, parse_optional, parse_sort};

/// Query parameters accepted by the attendance listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub batch_id: Option<String>,
    pub student_id: Option<String>,
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl AttendanceListQuery {
    /// Splits the query into filter, sort and page.
    pub fn into_parts(
        self,
    ) -> AppResult<(AttendanceFilter, Sort<AttendanceSortField>, PageRequest)> {
        let filter = AttendanceFilter {
            batch_id: parse_optional("batch_id", self.batch_id.as_deref(), BatchId::parse)?,
            student_id: parse_optional("student_id", self.student_id.as_deref(), StudentId::parse)?,
            status: parse_optional("status", self.status.as_deref(), AttendanceStatus::from_str)?,
            date_from: parse_optional("date_from", self.date_from.as_deref(), parse_date)?,
            date_to: parse_optional("date_to", self.date_to.as_deref(), parse_date)?,
        };
        let sort = parse_sort(
            self.sort.as_deref(),
            self.order.as_deref(),
            AttendanceSortField::parse_transport,
        )?;

        Ok((filter, sort, PageRequest::new(self.page, self.limit)))
    }
}

/// One student's status inside a bulk submission.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/attendance-entry-request.ts"
)]
pub struct AttendanceEntryRequest {
    pub student_id: String,
    pub status: String,
}

/// Whole-class attendance submission for one date.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bulk-attendance-request.ts"
)]
pub struct BulkAttendanceRequest {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub entries: Vec<AttendanceEntryRequest>,
}

impl BulkAttendanceRequest {
    /// Parses the class date and every entry.
    pub fn into_entries(self) -> AppResult<(NaiveDate, Vec<AttendanceEntry>)> {
        let date = parse_field("date", &self.date, parse_date)?;
        let entries = self
            .entries
            .into_iter()
            .map(|entry| {
                Ok(AttendanceEntry {
                    student_id: parse_field("student_id", &entry.student_id, StudentId::parse)?,
                    status: parse_field("status", &entry.status, AttendanceStatus::from_str)?,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok((date, entries))
    }
}

/// Single-student attendance mark.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/attendance-mark-request.ts"
)]
pub struct AttendanceMarkRequest {
    pub date: String,
    pub status: String,
}

impl AttendanceMarkRequest {
    /// Parses the class date and status.
    pub fn into_parts(self) -> AppResult<(NaiveDate, AttendanceStatus)> {
        Ok((
            parse_field("date", &self.date, parse_date)?,
            parse_field("status", &self.status, AttendanceStatus::from_str)?,
        ))
    }
}

/// API representation of one ledger row.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/attendance-record-response.ts"
)]
pub struct AttendanceRecordResponse {
    pub date: String,
    pub student_id: String,
    pub batch_id: String,
    pub status: String,
    pub marked_by: String,
    pub marked_at: String,
}

impl From<AttendanceRecord> for AttendanceRecordResponse {
    fn from(record: AttendanceRecord) -> Self {
        Self {
            date: record.date().to_string(),
            student_id: record.student_id().to_string(),
            batch_id: record.batch_id().to_string(),
            status: record.status().as_str().to_owned(),
            marked_by: record.marked_by().to_string(),
            marked_at: record.marked_at().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use academy_core::AppError;
    use academy_domain::AttendanceStatus;

    use super::{AttendanceEntryRequest, AttendanceListQuery, BulkAttendanceRequest};

    #[test]
    fn bulk_request_parses_every_entry() {
        let request = BulkAttendanceRequest {
            date: "2024-01-15".to_owned(),
            entries: vec![
                AttendanceEntryRequest {
                    student_id: "7f1c7c52-9a0b-4d7e-8a43-61d8c2b4f0a1".to_owned(),
                    status: "PRESENT".to_owned(),
                },
                AttendanceEntryRequest {
                    student_id: "2e4b1d0f-3c5a-4e6f-9b7d-8a1c2d3e4f50".to_owned(),
                    status: "ABSENT".to_owned(),
                },
            ],
        };

        let parsed = request.into_entries();
        assert!(matches!(
            parsed,
            Ok((_, ref entries))
                if entries.len() == 2 && entries[1].status == AttendanceStatus::Absent
        ));
    }

    #[test]
    fn unknown_status_rejects_the_whole_submission() {
        let request = BulkAttendanceRequest {
            date: "2024-01-15".to_owned(),
            entries: vec![AttendanceEntryRequest {
                student_id: "7f1c7c52-9a0b-4d7e-8a43-61d8c2b4f0a1".to_owned(),
                status: "SICK".to_owned(),
            }],
        };

        assert!(matches!(
            request.into_entries(),
            Err(AppError::InvalidFields(ref v)) if v[0].field == "status"
        ));
    }

    #[test]
    fn list_query_parses_date_bounds() {
        let query = AttendanceListQuery {
            date_from: Some("2024-01-01".to_owned()),
            date_to: Some("2024-01-31".to_owned()),
            ..AttendanceListQuery::default()
        };

        let parts = query.into_parts();
        assert!(matches!(
            parts,
            Ok((ref filter, _, _)) if filter.date_from.is_some() && filter.date_to.is_some()
        ));
    }
}
