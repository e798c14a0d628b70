mod activity;
mod attendance;
mod auth;
mod batches;
mod common;
mod fees;
mod students;

pub use activity::{ActivityEntryResponse, ActivityListQuery};
pub use attendance::{
    AttendanceListQuery, AttendanceMarkRequest, AttendanceRecordResponse, BulkAttendanceRequest,
};
pub use auth::{CallerResponse, SessionRequest};
pub use batches::{BatchListQuery, BatchRequest, BatchResponse};
pub use common::{HealthResponse, ListResponse, PageMetaResponse};
pub use fees::{FeeListQuery, FeeRequest, FeeResponse, OverdueSweepRequest, PayFeeRequest};
pub use students::{StudentListQuery, StudentRequest, StudentResponse};
