use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use academy_core::{AppError, AppResult, FieldViolation, UserId};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::BatchId;

/// Day of the week a batch meets on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    /// Monday.
    Monday,
    /// Tuesday.
    Tuesday,
    /// Wednesday.
    Wednesday,
    /// Thursday.
    Thursday,
    /// Friday.
    Friday,
    /// Saturday.
    Saturday,
    /// Sunday.
    Sunday,
}

impl DayOfWeek {
    /// Returns the stable storage value for this day.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "MONDAY",
            Self::Tuesday => "TUESDAY",
            Self::Wednesday => "WEDNESDAY",
            Self::Thursday => "THURSDAY",
            Self::Friday => "FRIDAY",
            Self::Saturday => "SATURDAY",
            Self::Sunday => "SUNDAY",
        }
    }
}

impl Display for DayOfWeek {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "MONDAY" => Ok(Self::Monday),
            "TUESDAY" => Ok(Self::Tuesday),
            "WEDNESDAY" => Ok(Self::Wednesday),
            "THURSDAY" => Ok(Self::Thursday),
            "FRIDAY" => Ok(Self::Friday),
            "SATURDAY" => Ok(Self::Saturday),
            "SUNDAY" => Ok(Self::Sunday),
            _ => Err(AppError::Validation(format!(
                "unknown day of week '{value}'"
            ))),
        }
    }
}

/// Daily time window a batch meets in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeSlot {
    /// Creates a time slot whose start precedes its end.
    pub fn new(start: NaiveTime, end: NaiveTime) -> AppResult<Self> {
        if start >= end {
            return Err(AppError::Validation(format!(
                "time slot start '{start}' must be before end '{end}'"
            )));
        }

        Ok(Self { start, end })
    }

    /// Returns the slot start time.
    #[must_use]
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Returns the slot end time.
    #[must_use]
    pub fn end(&self) -> NaiveTime {
        self.end
    }
}

/// Unvalidated batch attributes supplied by a create or update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInput {
    /// Batch display name.
    pub name: String,
    /// Curriculum level taught in the batch.
    pub level: String,
    /// Meeting days.
    pub days: BTreeSet<DayOfWeek>,
    /// Slot start time.
    pub start_time: NaiveTime,
    /// Slot end time.
    pub end_time: NaiveTime,
    /// Owning teacher, if one is assigned.
    pub teacher_id: Option<UserId>,
}

/// A class group with a schedule and at most one owning teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    id: BatchId,
    name: String,
    level: String,
    days: BTreeSet<DayOfWeek>,
    time_slot: TimeSlot,
    teacher_id: Option<UserId>,
}

impl Batch {
    /// Validates input and builds a batch, reporting every offending field.
    pub fn new(id: BatchId, input: BatchInput) -> AppResult<Self> {
        let mut violations = Vec::new();

        if input.name.trim().is_empty() {
            violations.push(FieldViolation::new("name", "must not be empty"));
        }
        if input.level.trim().is_empty() {
            violations.push(FieldViolation::new("level", "must not be empty"));
        }
        if input.days.is_empty() {
            violations.push(FieldViolation::new(
                "days",
                "must contain at least one day",
            ));
        }
        let time_slot = match TimeSlot::new(input.start_time, input.end_time) {
            Ok(time_slot) => Some(time_slot),
            Err(_) => {
                violations.push(FieldViolation::new(
                    "end_time",
                    "must be later than start_time",
                ));
                None
            }
        };

        match time_slot {
            Some(time_slot) if violations.is_empty() => Ok(Self {
                id,
                name: input.name.trim().to_owned(),
                level: input.level.trim().to_owned(),
                days: input.days,
                time_slot,
                teacher_id: input.teacher_id,
            }),
            _ => Err(AppError::InvalidFields(violations)),
        }
    }

    /// Returns the batch identifier.
    #[must_use]
    pub fn id(&self) -> BatchId {
        self.id
    }

    /// Returns the batch name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the batch level.
    #[must_use]
    pub fn level(&self) -> &str {
        self.level.as_str()
    }

    /// Returns the meeting days.
    #[must_use]
    pub fn days(&self) -> &BTreeSet<DayOfWeek> {
        &self.days
    }

    /// Returns the daily time slot.
    #[must_use]
    pub fn time_slot(&self) -> TimeSlot {
        self.time_slot
    }

    /// Returns the owning teacher, if any.
    #[must_use]
    pub fn teacher_id(&self) -> Option<UserId> {
        self.teacher_id
    }

    /// Returns whether the given user owns the batch as its teacher.
    #[must_use]
    pub fn is_taught_by(&self, user_id: UserId) -> bool {
        self.teacher_id == Some(user_id)
    }
}
