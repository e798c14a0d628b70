use std::str::FromStr;

use academy_application::{FeeFilter, FeeSortField, PageRequest, Sort};
use academy_core::AppResult;
use academy_domain::{FeeInput, FeeRecord, FeeStatus, StudentId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::{parse_date, parse_field, parse_optional, parse_sort};

/// Query parameters accepted by the fee listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub student_id: Option<String>,
    pub status: Option<String>,
    pub due_from: Option<String>,
    pub due_to: Option<String>,
}

impl FeeListQuery {
    /// Splits the query into filter, sort and page.
    pub fn into_parts(self) -> AppResult<(FeeFilter, Sort<FeeSortField>, PageRequest)> {
        let filter = FeeFilter {
            student_id: parse_optional("student_id", self.student_id.as_deref(), StudentId::parse)?,
            status: parse_optional("status", self.status.as_deref(), FeeStatus::from_str)?,
            due_from: parse_optional("due_from", self.due_from.as_deref(), parse_date)?,
            due_to: parse_optional("due_to", self.due_to.as_deref(), parse_date)?,
        };
        let sort = parse_sort(
            self.sort.as_deref(),
            self.order.as_deref(),
            FeeSortField::parse_transport,
        )?;

        Ok((filter, sort, PageRequest::new(self.page, self.limit)))
    }
}

/// Incoming payload for fee create and update.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/fee-request.ts"
)]
pub struct FeeRequest {
    pub student_id: String,
    /// Minor currency units.
    #[ts(type = "number")]
    pub amount: i64,
    pub due_date: String,
}

impl FeeRequest {
    /// Validates transport fields and builds the domain input.
    pub fn into_input(self) -> AppResult<FeeInput> {
        Ok(FeeInput {
            student_id: parse_field("student_id", &self.student_id, StudentId::parse)?,
            amount_minor: self.amount,
            due_date: parse_field("due_date", &self.due_date, parse_date)?,
        })
    }
}

/// Settlement payload; the date defaults to today.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/pay-fee-request.ts"
)]
pub struct PayFeeRequest {
    #[ts(optional)]
    pub paid_on: Option<String>,
}

impl PayFeeRequest {
    /// Returns the settlement date, falling back to `today`.
    pub fn paid_on_or(self, today: NaiveDate) -> AppResult<NaiveDate> {
        Ok(parse_optional("paid_on", self.paid_on.as_deref(), parse_date)?.unwrap_or(today))
    }
}

/// Overdue sweep payload; the reference date defaults to today.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/overdue-sweep-request.ts"
)]
pub struct OverdueSweepRequest {
    #[ts(optional)]
    pub today: Option<String>,
}

impl OverdueSweepRequest {
    /// Returns the reference date, falling back to `today`.
    pub fn today_or(self, today: NaiveDate) -> AppResult<NaiveDate> {
        Ok(parse_optional("today", self.today.as_deref(), parse_date)?.unwrap_or(today))
    }
}

/// API representation of a fee.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/fee-response.ts"
)]
pub struct FeeResponse {
    pub id: String,
    pub student_id: String,
    #[ts(type = "number")]
    pub amount: i64,
    pub due_date: String,
    pub status: String,
    pub paid_date: Option<String>,
}

impl From<FeeRecord> for FeeResponse {
    fn from(fee: FeeRecord) -> Self {
        Self {
            id: fee.id().to_string(),
            student_id: fee.student_id().to_string(),
            amount: fee.amount_minor(),
            due_date: fee.due_date().to_string(),
            status: fee.status().as_str().to_owned(),
            paid_date: fee.paid_date().map(|paid_date| paid_date.to_string()),
        }
    }
}
