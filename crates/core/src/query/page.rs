//! Pagination options and paged results.

use crate::constants::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::query::sort::{SortDirection, SortField};
use crate::{ReportError, ReportResult};
use serde::Serialize;

/// Validated pagination and ordering for a listing.
///
/// `limit` is always within `1..=MAX_PAGE_LIMIT`, so page arithmetic never divides by zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageOptions {
    limit: usize,
    offset: usize,
    sort_by: SortField,
    sort_direction: SortDirection,
}

impl PageOptions {
    /// Creates page options.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidParameter`] if `limit` is zero or above the maximum page size.
    pub fn new(
        limit: usize,
        offset: usize,
        sort_by: SortField,
        sort_direction: SortDirection,
    ) -> ReportResult<Self> {
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(ReportError::InvalidParameter(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }

        Ok(Self {
            limit,
            offset,
            sort_by,
            sort_direction,
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn sort_by(&self) -> SortField {
        self.sort_by
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    /// 1-based page number that `offset` falls on.
    ///
    /// Saturates at `usize::MAX` for offsets on the last representable page.
    pub fn page_number(&self) -> usize {
        (self.offset / self.limit).saturating_add(1)
    }
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
            sort_by: SortField::default(),
            sort_direction: SortDirection::default(),
        }
    }
}

/// One page of results plus metadata about the full result set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    /// Number of matches before slicing.
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// The page returned when nothing matched: always page 1 of 0.
    pub fn empty(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            page: 1,
            limit,
            total_pages: 0,
        }
    }

    /// Slices `items` (already filtered and sorted) according to `options`.
    ///
    /// An empty `items` yields [`Page::empty`].
    pub fn from_sorted(items: Vec<T>, options: &PageOptions) -> Self {
        let total = items.len();
        if total == 0 {
            return Self::empty(options.limit());
        }

        let data = items
            .into_iter()
            .skip(options.offset())
            .take(options.limit())
            .collect();

        Self {
            data,
            total,
            page: options.page_number(),
            limit: options.limit(),
            total_pages: total.div_ceil(options.limit()),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}
