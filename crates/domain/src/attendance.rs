use std::fmt::{Display, Formatter};
use std::str::FromStr;

use academy_core::{AppError, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{BatchId, StudentId};

/// Presence status recorded for one student on one day in one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    /// Student attended.
    Present,
    /// Student did not attend.
    Absent,
    /// Student attended late.
    Late,
    /// Absence was excused.
    Excused,
}

impl AttendanceStatus {
    /// Returns the stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "PRESENT",
            Self::Absent => "ABSENT",
            Self::Late => "LATE",
            Self::Excused => "EXCUSED",
        }
    }
}

impl Display for AttendanceStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "PRESENT" => Ok(Self::Present),
            "ABSENT" => Ok(Self::Absent),
            "LATE" => Ok(Self::Late),
            "EXCUSED" => Ok(Self::Excused),
            _ => Err(AppError::Validation(format!(
                "unknown attendance status '{value}'"
            ))),
        }
    }
}

/// Natural key of the attendance ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttendanceKey {
    /// Class date.
    pub date: NaiveDate,
    /// Student the record is about.
    pub student_id: StudentId,
    /// Batch the class belongs to.
    pub batch_id: BatchId,
}

/// One student/status pair submitted when marking a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceEntry {
    /// Student being marked.
    pub student_id: StudentId,
    /// Status to record.
    pub status: AttendanceStatus,
}

/// Ledger row; at most one exists per [`AttendanceKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    key: AttendanceKey,
    status: AttendanceStatus,
    marked_by: UserId,
    marked_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Creates a ledger row.
    #[must_use]
    pub fn new(
        key: AttendanceKey,
        status: AttendanceStatus,
        marked_by: UserId,
        marked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            status,
            marked_by,
            marked_at,
        }
    }

    /// Returns the natural key.
    #[must_use]
    pub fn key(&self) -> AttendanceKey {
        self.key
    }

    /// Returns the class date.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.key.date
    }

    /// Returns the student.
    #[must_use]
    pub fn student_id(&self) -> StudentId {
        self.key.student_id
    }

    /// Returns the batch.
    #[must_use]
    pub fn batch_id(&self) -> BatchId {
        self.key.batch_id
    }

    /// Returns the recorded status.
    #[must_use]
    pub fn status(&self) -> AttendanceStatus {
        self.status
    }

    /// Returns who last marked the record.
    #[must_use]
    pub fn marked_by(&self) -> UserId {
        self.marked_by
    }

    /// Returns when the record was last marked.
    #[must_use]
    pub fn marked_at(&self) -> DateTime<Utc> {
        self.marked_at
    }

    /// Overwrites the status in place, keeping the natural key.
    pub fn remark(
        &mut self,
        status: AttendanceStatus,
        marked_by: UserId,
        marked_at: DateTime<Utc>,
    ) {
        self.status = status;
        self.marked_by = marked_by;
        self.marked_at = marked_at;
    }
}
