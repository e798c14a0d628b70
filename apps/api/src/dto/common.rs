use academy_application::{Page, PageMeta, Sort, SortDirection};
use academy_core::{AppError, AppResult, FieldViolation};
use chrono::NaiveDate;
use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: &'static str,
}

/// Pagination metadata returned with every listing.
#[derive(Debug, Clone, Copy, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/page-meta-response.ts"
)]
pub struct PageMetaResponse {
    #[ts(type = "number")]
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    #[ts(type = "number")]
    pub total_pages: u64,
}

impl From<PageMeta> for PageMetaResponse {
    fn from(meta: PageMeta) -> Self {
        Self {
            total: meta.total,
            page: meta.page,
            limit: meta.limit,
            total_pages: meta.total_pages,
        }
    }
}

/// Paginated listing envelope.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub meta: PageMetaResponse,
}

impl<T> ListResponse<T> {
    /// Converts a domain page into its transport form.
    #[must_use]
    pub fn from_page<U>(page: Page<U>) -> Self
    where
        T: From<U>,
    {
        Self {
            data: page.data.into_iter().map(T::from).collect(),
            meta: page.meta.into(),
        }
    }
}

pub(super) fn invalid_field(field: &str, message: impl Into<String>) -> AppError {
    AppError::InvalidFields(vec![FieldViolation::new(field, message)])
}

/// Parses one transport value, reporting failures against `field`.
pub(super) fn parse_field<T>(
    field: &str,
    value: &str,
    parse: impl FnOnce(&str) -> AppResult<T>,
) -> AppResult<T> {
    parse(value).map_err(|error| match error {
        AppError::Validation(message) => invalid_field(field, message),
        other => other,
    })
}

/// Like [`parse_field`], treating absent and blank values alike.
pub(super) fn parse_optional<T>(
    field: &str,
    value: Option<&str>,
    parse: impl FnOnce(&str) -> AppResult<T>,
) -> AppResult<Option<T>> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(|value| parse_field(field, value, parse))
        .transpose()
}

pub(super) fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("'{value}' is not a YYYY-MM-DD date")))
}

pub(super) fn parse_bool(value: &str) -> AppResult<bool> {
    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(AppError::Validation(format!(
            "'{other}' is not true or false"
        ))),
    }
}

/// Builds a sort from the `sort` and `order` query parameters.
pub(super) fn parse_sort<F: Default>(
    sort: Option<&str>,
    order: Option<&str>,
    parse: impl FnOnce(&str) -> AppResult<F>,
) -> AppResult<Sort<F>> {
    Ok(Sort {
        field: parse_optional("sort", sort, parse)?.unwrap_or_default(),
        direction: parse_optional("order", order, SortDirection::parse_transport)?
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use academy_application::{SortDirection, StudentSortField};
    use academy_core::AppError;

    use super::{parse_date, parse_optional, parse_sort};

    #[test]
    fn blank_values_are_treated_as_absent() {
        let parsed = parse_optional("date_from", Some("  "), parse_date);
        assert!(matches!(parsed, Ok(None)));
    }

    #[test]
    fn parse_failures_name_the_field() {
        let parsed = parse_optional("date_from", Some("15/01/2024"), parse_date);
        let Err(AppError::InvalidFields(violations)) = parsed else {
            panic!("expected a field violation");
        };
        assert_eq!(violations[0].field, "date_from");
    }

    #[test]
    fn sort_defaults_and_rejects_unknown_fields() {
        let sort = parse_sort(None, Some("desc"), StudentSortField::parse_transport);
        assert!(matches!(
            sort,
            Ok(sort)
                if sort.field == StudentSortField::Name && sort.direction == SortDirection::Desc
        ));

        let unknown = parse_sort(Some("password"), None, StudentSortField::parse_transport);
        assert!(matches!(unknown, Err(AppError::InvalidFields(ref v)) if v[0].field == "sort"));
    }
}
