//! Filtering, sorting and pagination of report listings.
//!
//! The pipeline runs in a fixed order: match against a [`ReportPredicate`], sort the matches,
//! then slice them into a [`Page`]. Validation of caller input happens before this module; see
//! [`crate::validation`].

pub mod filter;
pub mod page;
pub mod sort;

pub use filter::{Criterion, ReportFilter, ReportPredicate};
pub use page::{Page, PageOptions};
pub use sort::{sort_reports, SortDirection, SortField};

use crate::report::Report;

/// Sorts `matches` by the requested field and direction, then slices out the requested page.
///
/// `total` in the result is the number of `matches` before slicing. Sorting an empty match
/// list is a no-op, so zero matches go straight to [`Page::empty`].
pub fn paginate_reports(mut matches: Vec<Report>, options: &PageOptions) -> Page<Report> {
    sort_reports(&mut matches, options.sort_by(), options.sort_direction());
    Page::from_sorted(matches, options)
}
