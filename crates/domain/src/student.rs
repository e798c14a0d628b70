use academy_core::{AppError, AppResult, FieldViolation, UserId};
use serde::{Deserialize, Serialize};

use crate::{BatchId, StudentId};

/// Unvalidated student attributes supplied by a create or update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentInput {
    /// Student full name.
    pub name: String,
    /// Curriculum level.
    pub level: String,
    /// Whether the student is currently enrolled.
    pub is_active: bool,
    /// Owning parent account.
    pub parent_id: UserId,
    /// Batch the student attends, if any.
    pub batch_id: Option<BatchId>,
}

/// A student owned by exactly one parent and enrolled in at most one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    id: StudentId,
    name: String,
    level: String,
    is_active: bool,
    parent_id: UserId,
    batch_id: Option<BatchId>,
}

impl Student {
    /// Validates input and builds a student.
    pub fn new(id: StudentId, input: StudentInput) -> AppResult<Self> {
        Self::validate_profile(&input.name, &input.level)?;

        Ok(Self {
            id,
            name: input.name.trim().to_owned(),
            level: input.level.trim().to_owned(),
            is_active: input.is_active,
            parent_id: input.parent_id,
            batch_id: input.batch_id,
        })
    }

    /// Checks the free-text fields without building a student.
    pub fn validate_profile(name: &str, level: &str) -> AppResult<()> {
        let mut violations = Vec::new();
        if name.trim().is_empty() {
            violations.push(FieldViolation::new("name", "must not be empty"));
        }
        if level.trim().is_empty() {
            violations.push(FieldViolation::new("level", "must not be empty"));
        }
        if !violations.is_empty() {
            return Err(AppError::InvalidFields(violations));
        }

        Ok(())
    }

    /// Returns the student identifier.
    #[must_use]
    pub fn id(&self) -> StudentId {
        self.id
    }

    /// Returns the student name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the curriculum level.
    #[must_use]
    pub fn level(&self) -> &str {
        self.level.as_str()
    }

    /// Returns whether the student is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the owning parent.
    #[must_use]
    pub fn parent_id(&self) -> UserId {
        self.parent_id
    }

    /// Returns the current batch, if any.
    #[must_use]
    pub fn batch_id(&self) -> Option<BatchId> {
        self.batch_id
    }

    /// Returns a copy of the student detached from its batch.
    #[must_use]
    pub fn without_batch(&self) -> Self {
        Self {
            batch_id: None,
            ..self.clone()
        }
    }
}
