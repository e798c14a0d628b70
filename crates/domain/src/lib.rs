//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod attendance;
mod batch;
mod fee;
mod ids;
mod security;
mod student;
mod user;

pub use attendance::{AttendanceEntry, AttendanceKey, AttendanceRecord, AttendanceStatus};
pub use batch::{Batch, BatchInput, DayOfWeek, TimeSlot};
pub use fee::{FeeInput, FeeRecord, FeeStatus};
pub use ids::{BatchId, FeeId, StudentId};
pub use security::{ActivityAction, Permission, permissions_for, permissions_for_role_name};
pub use student::{Student, StudentInput};
pub use user::{EmailAddress, UserAccount};
