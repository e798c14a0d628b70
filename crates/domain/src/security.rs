use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::LazyLock;

use academy_core::{AppError, Role};
use serde::{Deserialize, Serialize};

/// Permissions enforced by application policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows reading student records within scope.
    StudentRead,
    /// Allows creating, updating and deleting students.
    StudentWrite,
    /// Allows reading batches within scope.
    BatchRead,
    /// Allows creating, updating and deleting batches.
    BatchWrite,
    /// Allows reading attendance records within scope.
    AttendanceRead,
    /// Allows marking attendance for owned batches.
    MarkAttendance,
    /// Allows reading fee records within scope.
    FeeRead,
    /// Allows creating, updating, settling and deleting fee records.
    FeeWrite,
    /// Allows reading the activity log.
    ActivityLogRead,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StudentRead => "student.read",
            Self::StudentWrite => "student.write",
            Self::BatchRead => "batch.read",
            Self::BatchWrite => "batch.write",
            Self::AttendanceRead => "attendance.read",
            Self::MarkAttendance => "attendance.mark",
            Self::FeeRead => "fee.read",
            Self::FeeWrite => "fee.write",
            Self::ActivityLogRead => "activity.read",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::StudentRead,
            Permission::StudentWrite,
            Permission::BatchRead,
            Permission::BatchWrite,
            Permission::AttendanceRead,
            Permission::MarkAttendance,
            Permission::FeeRead,
            Permission::FeeWrite,
            Permission::ActivityLogRead,
        ];

        ALL
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|permission| permission.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}

static ROLE_PERMISSIONS: LazyLock<HashMap<Role, BTreeSet<Permission>>> = LazyLock::new(|| {
    HashMap::from([
        (Role::Admin, Permission::all().iter().copied().collect()),
        (
            Role::Teacher,
            BTreeSet::from([
                Permission::StudentRead,
                Permission::BatchRead,
                Permission::AttendanceRead,
                Permission::MarkAttendance,
            ]),
        ),
        (
            Role::Parent,
            BTreeSet::from([
                Permission::StudentRead,
                Permission::BatchRead,
                Permission::AttendanceRead,
                Permission::FeeRead,
            ]),
        ),
    ])
});

static NO_PERMISSIONS: BTreeSet<Permission> = BTreeSet::new();

/// Returns the fixed permission set granted to a role.
#[must_use]
pub fn permissions_for(role: Role) -> &'static BTreeSet<Permission> {
    ROLE_PERMISSIONS.get(&role).unwrap_or(&NO_PERMISSIONS)
}

/// Resolves permissions from a stored role name.
///
/// Unrecognized role names resolve to the empty set.
#[must_use]
pub fn permissions_for_role_name(role_name: &str) -> BTreeSet<Permission> {
    Role::from_str(role_name)
        .map(|role| permissions_for(role).clone())
        .unwrap_or_default()
}

/// Stable activity actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    /// A student record was created.
    StudentCreated,
    /// A student record was updated.
    StudentUpdated,
    /// A student record was deleted.
    StudentDeleted,
    /// A parent account was created while enrolling a student.
    ParentAccountCreated,
    /// A batch was created.
    BatchCreated,
    /// A batch was updated.
    BatchUpdated,
    /// A batch was deleted.
    BatchDeleted,
    /// Attendance was marked for one or more students.
    AttendanceMarked,
    /// A fee record was created.
    FeeCreated,
    /// A fee record was updated.
    FeeUpdated,
    /// A fee record was deleted.
    FeeDeleted,
    /// A fee record was settled.
    FeePaid,
    /// Pending fees past their due date were flagged overdue.
    FeesMarkedOverdue,
}

impl ActivityAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StudentCreated => "student.created",
            Self::StudentUpdated => "student.updated",
            Self::StudentDeleted => "student.deleted",
            Self::ParentAccountCreated => "parent.created",
            Self::BatchCreated => "batch.created",
            Self::BatchUpdated => "batch.updated",
            Self::BatchDeleted => "batch.deleted",
            Self::AttendanceMarked => "attendance.marked",
            Self::FeeCreated => "fee.created",
            Self::FeeUpdated => "fee.updated",
            Self::FeeDeleted => "fee.deleted",
            Self::FeePaid => "fee.paid",
            Self::FeesMarkedOverdue => "fee.overdue_marked",
        }
    }

    /// Returns every action.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::StudentCreated,
            Self::StudentUpdated,
            Self::StudentDeleted,
            Self::ParentAccountCreated,
            Self::BatchCreated,
            Self::BatchUpdated,
            Self::BatchDeleted,
            Self::AttendanceMarked,
            Self::FeeCreated,
            Self::FeeUpdated,
            Self::FeeDeleted,
            Self::FeePaid,
            Self::FeesMarkedOverdue,
        ]
    }
}

impl FromStr for ActivityAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown activity action '{value}'")))
    }
}
