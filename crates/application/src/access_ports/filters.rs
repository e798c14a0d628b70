use academy_core::{AppError, AppResult, UserId};
use academy_domain::{AttendanceStatus, BatchId, DayOfWeek, FeeStatus, StudentId};
use chrono::NaiveDate;

/// Caller-supplied narrowing for student listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFilter {
    /// Only students enrolled in this batch.
    pub batch_id: Option<BatchId>,
    /// Only students owned by this parent.
    pub parent_id: Option<UserId>,
    /// Only active or inactive students.
    pub is_active: Option<bool>,
    /// Only students at this level.
    pub level: Option<String>,
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
}

/// Caller-supplied narrowing for batch listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchFilter {
    /// Only batches taught by this teacher.
    pub teacher_id: Option<UserId>,
    /// Only batches at this level.
    pub level: Option<String>,
    /// Only batches meeting on this day.
    pub day: Option<DayOfWeek>,
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
}

/// Caller-supplied narrowing for fee listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeFilter {
    /// Only fees charged to this student.
    pub student_id: Option<StudentId>,
    /// Only fees in this status.
    pub status: Option<FeeStatus>,
    /// Inclusive lower bound on the due date.
    pub due_from: Option<NaiveDate>,
    /// Inclusive upper bound on the due date.
    pub due_to: Option<NaiveDate>,
}

/// Caller-supplied narrowing for attendance listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceFilter {
    /// Only records for this batch.
    pub batch_id: Option<BatchId>,
    /// Only records for this student.
    pub student_id: Option<StudentId>,
    /// Only records with this status.
    pub status: Option<AttendanceStatus>,
    /// Inclusive lower bound on the class date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the class date.
    pub date_to: Option<NaiveDate>,
}

impl AttendanceFilter {
    /// Returns whether the date bounds describe an empty range.
    #[must_use]
    pub fn has_inverted_range(&self) -> bool {
        matches!((self.date_from, self.date_to), (Some(from), Some(to)) if from > to)
    }
}

macro_rules! transport_names {
    ($name:ident, { $($variant:ident => $value:literal),+ $(,)? }) => {
        impl $name {
            /// Returns the transport name of this sort field.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            /// Parses a transport name, rejecting unknown fields.
            pub fn parse_transport(value: &str) -> AppResult<Self> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(AppError::Validation(format!("unknown sort field '{value}'"))),
                }
            }
        }
    };
}

/// Sortable student fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StudentSortField {
    /// Student name.
    #[default]
    Name,
    /// Curriculum level.
    Level,
}

/// Sortable batch fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchSortField {
    /// Batch name.
    #[default]
    Name,
    /// Curriculum level.
    Level,
    /// Slot start time.
    StartTime,
}

/// Sortable fee fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeeSortField {
    /// Due date.
    #[default]
    DueDate,
    /// Amount.
    Amount,
    /// Status.
    Status,
}

/// Sortable attendance fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttendanceSortField {
    /// Class date.
    #[default]
    Date,
    /// Status.
    Status,
}

transport_names!(StudentSortField, { Name => "name", Level => "level" });
transport_names!(BatchSortField, { Name => "name", Level => "level", StartTime => "startTime" });
transport_names!(FeeSortField, { DueDate => "dueDate", Amount => "amount", Status => "status" });
transport_names!(AttendanceSortField, { Date => "date", Status => "status" });
