mod activity;
mod filters;
mod notification;
mod query;
mod repositories;

pub use activity::{ActivityEntry, ActivityLogEntry, ActivityLogQuery, ActivityLogRepository};
pub use filters::{
    AttendanceFilter, AttendanceSortField, BatchFilter, BatchSortField, FeeFilter, FeeSortField,
    StudentFilter, StudentSortField,
};
pub use notification::NotificationSender;
pub use query::{
    AttendanceQuery, BatchQuery, FeeQuery, Page, PageMeta, PageRequest, ScopedQuery, Sort,
    SortDirection, StudentQuery,
};
pub use repositories::{
    AttendanceLedger, BatchRepository, FeeRepository, StudentRepository, UserRepository,
};
