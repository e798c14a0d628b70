//! Application services and ports.

#![forbid(unsafe_code)]

mod access_ports;
mod activity_service;
mod attendance_service;
mod authorization_service;
mod batch_service;
mod fee_service;
mod rate_limit_service;
mod resource_scope;
mod student_service;

#[cfg(test)]
mod test_support;

pub use access_ports::{
    ActivityEntry, ActivityLogEntry, ActivityLogQuery, ActivityLogRepository, AttendanceFilter,
    AttendanceLedger, AttendanceQuery, AttendanceSortField, BatchFilter, BatchQuery,
    BatchRepository, BatchSortField, FeeFilter, FeeQuery, FeeRepository, FeeSortField,
    NotificationSender, Page, PageMeta, PageRequest, ScopedQuery, Sort, SortDirection,
    StudentFilter, StudentQuery, StudentRepository, StudentSortField, UserRepository,
};
pub use activity_service::ActivityService;
pub use attendance_service::AttendanceService;
pub use authorization_service::AuthorizationService;
pub use batch_service::BatchService;
pub use fee_service::FeeService;
pub use rate_limit_service::{AttemptInfo, RateLimitRepository, RateLimitRule, RateLimitService};
pub use resource_scope::{
    AttendanceScope, BatchScope, FeeScope, ResourceScope, ScopePredicate, StudentScope,
};
pub use student_service::{ParentReference, StudentService, StudentWrite};
