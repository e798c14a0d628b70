use serde::Serialize;

use crate::ScopePredicate;
use crate::access_ports::filters::{
    AttendanceFilter, AttendanceSortField, BatchFilter, BatchSortField, FeeFilter, FeeSortField,
    StudentFilter, StudentSortField,
};

/// Default page size when the caller does not supply one.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// One-based pagination request with a clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Normalizes caller-supplied pagination: page >= 1, limit in `1..=100`.
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Returns the one-based page number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the number of rows to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata returned with every list result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Rows matching the scoped query across all pages.
    pub total: u64,
    /// One-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Number of pages needed to cover `total`.
    pub total_pages: u64,
}

/// A page of rows plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Rows on this page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Builds a page from the rows of one page and the scoped total.
    #[must_use]
    pub fn new(data: Vec<T>, total: u64, request: PageRequest) -> Self {
        let limit = u64::from(request.limit());
        Self {
            data,
            meta: PageMeta {
                total,
                page: request.page(),
                limit: request.limit(),
                total_pages: total.div_ceil(limit),
            },
        }
    }

    /// Maps every row, keeping the metadata.
    pub fn map<U>(self, transform: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(transform).collect(),
            meta: self.meta,
        }
    }
}

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Parses a transport value into a direction.
    pub fn parse_transport(value: &str) -> academy_core::AppResult<Self> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(academy_core::AppError::Validation(format!(
                "unknown sort direction '{value}'"
            ))),
        }
    }
}

/// Sort instruction over a closed set of fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort<F> {
    /// Field to order by.
    pub field: F,
    /// Order direction.
    pub direction: SortDirection,
}

/// List query whose role scope and caller filter are kept apart.
///
/// Repositories must evaluate `scope AND filter`; the filter can only narrow
/// what the scope admits. Access services build these from the caller's
/// [`ResourceScope`](crate::ResourceScope).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedQuery<F, S> {
    scope: ScopePredicate,
    filter: F,
    sort: Sort<S>,
    page: PageRequest,
}

impl<F, S: Copy> ScopedQuery<F, S> {
    /// Pairs a scope with a caller filter.
    #[must_use]
    pub fn new(scope: ScopePredicate, filter: F, sort: Sort<S>, page: PageRequest) -> Self {
        Self {
            scope,
            filter,
            sort,
            page,
        }
    }

    /// Returns the role-derived scope.
    #[must_use]
    pub fn scope(&self) -> &ScopePredicate {
        &self.scope
    }

    /// Returns the caller-supplied filter.
    #[must_use]
    pub fn filter(&self) -> &F {
        &self.filter
    }

    /// Returns the sort instruction.
    #[must_use]
    pub fn sort(&self) -> Sort<S> {
        self.sort
    }

    /// Returns the pagination request.
    #[must_use]
    pub fn page(&self) -> PageRequest {
        self.page
    }
}

/// Scoped student listing query.
pub type StudentQuery = ScopedQuery<StudentFilter, StudentSortField>;
/// Scoped batch listing query.
pub type BatchQuery = ScopedQuery<BatchFilter, BatchSortField>;
/// Scoped fee listing query.
pub type FeeQuery = ScopedQuery<FeeFilter, FeeSortField>;
/// Scoped attendance listing query.
pub type AttendanceQuery = ScopedQuery<AttendanceFilter, AttendanceSortField>;
