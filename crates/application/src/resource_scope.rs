//! Role-to-row scoping strategies.
//!
//! This is the only place role branching happens for reads. Each access
//! service receives its strategy at construction and asks it for the
//! predicate a query must apply.

use academy_core::{Caller, Role, UserId};

/// Row filter derived from the caller's role and identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopePredicate {
    /// No ownership restriction.
    Unrestricted,
    /// Rows reachable through batches taught by this teacher.
    TeacherOf(UserId),
    /// Rows reachable through students owned by this parent.
    ParentOf(UserId),
}

impl ScopePredicate {
    /// Returns the predicate every role-based strategy produces for `caller`.
    #[must_use]
    pub fn for_caller(caller: &Caller) -> Self {
        match caller.role() {
            Role::Admin => Self::Unrestricted,
            Role::Teacher => Self::TeacherOf(caller.id()),
            Role::Parent => Self::ParentOf(caller.id()),
        }
    }
}

/// Strategy producing the scope predicate for one resource type.
pub trait ResourceScope: Send + Sync {
    /// Resource label used in logs and not-found messages.
    fn resource(&self) -> &'static str;

    /// Builds the predicate a query on this resource must apply for `caller`.
    fn predicate_for(&self, caller: &Caller) -> ScopePredicate {
        ScopePredicate::for_caller(caller)
    }
}

/// Students: teachers see their batches' students, parents their children.
#[derive(Debug, Clone, Copy, Default)]
pub struct StudentScope;

impl ResourceScope for StudentScope {
    fn resource(&self) -> &'static str {
        "student"
    }
}

/// Batches: teachers see batches they teach, parents batches their children attend.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchScope;

impl ResourceScope for BatchScope {
    fn resource(&self) -> &'static str {
        "batch"
    }
}

/// Attendance: teachers see their batches' records, parents their children's.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttendanceScope;

impl ResourceScope for AttendanceScope {
    fn resource(&self) -> &'static str {
        "attendance"
    }
}

/// Fees: parents see their children's fees.
///
/// Teachers hold no fee permission, so the teacher predicate is never
/// reached through the fee service.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeeScope;

impl ResourceScope for FeeScope {
    fn resource(&self) -> &'static str {
        "fee"
    }
}
