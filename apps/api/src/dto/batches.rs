use std::collections::BTreeSet;
use std::str::FromStr;

use academy_application::{BatchFilter, BatchSortField, PageRequest, Sort};
use academy_core::{AppError, AppResult, UserId};
use academy_domain::{Batch, BatchInput, DayOfWeek};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::{parse_field, parse_optional, parse_sort};

const TIME_FORMAT: &str = "%H:%M";

/// Query parameters accepted by the batch listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub teacher_id: Option<String>,
    pub level: Option<String>,
    pub day: Option<String>,
    pub search: Option<String>,
}

impl BatchListQuery {
    /// Splits the query into filter, sort and page.
    pub fn into_parts(self) -> AppResult<(BatchFilter, Sort<BatchSortField>, PageRequest)> {
        let filter = BatchFilter {
            teacher_id: parse_optional("teacher_id", self.teacher_id.as_deref(), UserId::parse)?,
            level: self.level.filter(|level| !level.trim().is_empty()),
            day: parse_optional("day", self.day.as_deref(), parse_day)?,
            search: self.search.filter(|search| !search.trim().is_empty()),
        };
        let sort = parse_sort(
            self.sort.as_deref(),
            self.order.as_deref(),
            BatchSortField::parse_transport,
        )?;

        Ok((filter, sort, PageRequest::new(self.page, self.limit)))
    }
}

/// Incoming payload for batch create and update.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/batch-request.ts"
)]
pub struct BatchRequest {
    pub name: String,
    pub level: String,
    /// Uppercase day names, e.g. `MONDAY`.
    pub days: Vec<String>,
    /// `HH:MM`, 24-hour clock.
    pub start_time: String,
    pub end_time: String,
    #[ts(optional)]
    pub teacher_id: Option<String>,
}

impl BatchRequest {
    /// Validates transport fields and builds the domain input.
    pub fn into_input(self) -> AppResult<BatchInput> {
        let days = self
            .days
            .iter()
            .map(|day| parse_field("days", day, parse_day))
            .collect::<AppResult<BTreeSet<_>>>()?;

        Ok(BatchInput {
            name: self.name,
            level: self.level,
            days,
            start_time: parse_field("start_time", &self.start_time, parse_time)?,
            end_time: parse_field("end_time", &self.end_time, parse_time)?,
            teacher_id: parse_optional("teacher_id", self.teacher_id.as_deref(), UserId::parse)?,
        })
    }
}

/// API representation of a batch.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/batch-response.ts"
)]
pub struct BatchResponse {
    pub id: String,
    pub name: String,
    pub level: String,
    pub days: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    pub teacher_id: Option<String>,
}

impl From<Batch> for BatchResponse {
    fn from(batch: Batch) -> Self {
        let time_slot = batch.time_slot();
        Self {
            id: batch.id().to_string(),
            name: batch.name().to_owned(),
            level: batch.level().to_owned(),
            days: batch.days().iter().map(|day| day.as_str().to_owned()).collect(),
            start_time: time_slot.start().format(TIME_FORMAT).to_string(),
            end_time: time_slot.end().format(TIME_FORMAT).to_string(),
            teacher_id: batch.teacher_id().map(|teacher_id| teacher_id.to_string()),
        }
    }
}

fn parse_day(value: &str) -> AppResult<DayOfWeek> {
    DayOfWeek::from_str(value.trim().to_ascii_uppercase().as_str())
}

fn parse_time(value: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
        .map_err(|_| AppError::Validation(format!("'{value}' is not an HH:MM time")))
}
