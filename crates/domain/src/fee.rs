use std::fmt::{Display, Formatter};
use std::str::FromStr;

use academy_core::{AppError, AppResult, FieldViolation};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{FeeId, StudentId};

/// Settlement status of a fee record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeStatus {
    /// Awaiting payment, not yet due.
    Pending,
    /// Settled. Terminal.
    Paid,
    /// Unpaid past its due date.
    Overdue,
}

impl FeeStatus {
    /// Returns the stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Overdue => "OVERDUE",
        }
    }
}

impl Display for FeeStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for FeeStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "OVERDUE" => Ok(Self::Overdue),
            _ => Err(AppError::Validation(format!("unknown fee status '{value}'"))),
        }
    }
}

/// Unvalidated fee attributes supplied by a create or update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeInput {
    /// Student the fee is charged to.
    pub student_id: StudentId,
    /// Amount in minor currency units.
    pub amount_minor: i64,
    /// Date payment is due.
    pub due_date: NaiveDate,
}

/// A charge against a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRecord {
    id: FeeId,
    student_id: StudentId,
    amount_minor: i64,
    due_date: NaiveDate,
    status: FeeStatus,
    paid_date: Option<NaiveDate>,
}

impl FeeRecord {
    /// Creates a new pending fee.
    pub fn new(id: FeeId, input: FeeInput) -> AppResult<Self> {
        validate_amount(input.amount_minor)?;

        Ok(Self {
            id,
            student_id: input.student_id,
            amount_minor: input.amount_minor,
            due_date: input.due_date,
            status: FeeStatus::Pending,
            paid_date: None,
        })
    }

    /// Rebuilds a fee from persisted values, enforcing `paid_date` iff `PAID`.
    pub fn from_storage(
        id: FeeId,
        input: FeeInput,
        status: FeeStatus,
        paid_date: Option<NaiveDate>,
    ) -> AppResult<Self> {
        validate_amount(input.amount_minor)?;
        if (status == FeeStatus::Paid) != paid_date.is_some() {
            return Err(AppError::Internal(format!(
                "fee '{id}' has status '{status}' inconsistent with its paid date"
            )));
        }

        Ok(Self {
            id,
            student_id: input.student_id,
            amount_minor: input.amount_minor,
            due_date: input.due_date,
            status,
            paid_date,
        })
    }

    /// Returns the fee identifier.
    #[must_use]
    pub fn id(&self) -> FeeId {
        self.id
    }

    /// Returns the charged student.
    #[must_use]
    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    /// Returns the due date.
    #[must_use]
    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> FeeStatus {
        self.status
    }

    /// Returns the settlement date, if paid.
    #[must_use]
    pub fn paid_date(&self) -> Option<NaiveDate> {
        self.paid_date
    }

    /// Changes amount, due date or student of an unsettled fee.
    pub fn revise(&mut self, input: FeeInput) -> AppResult<()> {
        if self.status == FeeStatus::Paid {
            return Err(AppError::Conflict(format!(
                "fee '{}' is already paid and cannot be revised",
                self.id
            )));
        }
        validate_amount(input.amount_minor)?;

        self.student_id = input.student_id;
        self.amount_minor = input.amount_minor;
        self.due_date = input.due_date;
        Ok(())
    }

    /// Settles the fee. PAID is terminal, so settling twice is a conflict.
    pub fn mark_paid(&mut self, paid_on: NaiveDate) -> AppResult<()> {
        if self.status == FeeStatus::Paid {
            return Err(AppError::Conflict(format!(
                "fee '{}' is already paid",
                self.id
            )));
        }

        self.status = FeeStatus::Paid;
        self.paid_date = Some(paid_on);
        Ok(())
    }

    /// Flags a pending fee overdue when `today` is past its due date.
    ///
    /// Returns whether the status changed.
    pub fn mark_overdue_if_due(&mut self, today: NaiveDate) -> bool {
        if self.status == FeeStatus::Pending && self.due_date < today {
            self.status = FeeStatus::Overdue;
            return true;
        }

        false
    }
}

fn validate_amount(amount_minor: i64) -> AppResult<()> {
    if amount_minor <= 0 {
        return Err(AppError::InvalidFields(vec![FieldViolation::new(
            "amount",
            "must be greater than zero",
        )]));
    }

    Ok(())
}
