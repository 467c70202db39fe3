//! Input validation utilities.
//!
//! Raw listing parameters arrive as optional strings (query string or CLI flags). This module
//! turns them into the typed [`ReportFilter`] and [`PageOptions`] the query pipeline expects,
//! rejecting out-of-range values with [`ReportError::InvalidParameter`] so the pipeline itself
//! never has to validate.
//!
//! New report bodies are checked by [`validate_new_report`], update bodies by
//! [`validate_report_patch`].

use crate::constants::{
    DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, PATIENT_NAME_LENGTH, SUMMARY_LENGTH,
};
use crate::query::{PageOptions, ReportFilter, SortDirection, SortField};
use crate::report::{parse_instant, ReportDraft, ReportPatch};
use crate::{ReportError, ReportResult};
use report_types::NonEmptyText;
use serde::Deserialize;

const INVALID_DATE_HINT: &str = "Use ISO format (YYYY-MM-DD or YYYY-MM-DDTHH:mm:ss.sssZ)";
const INVALID_REPORT_DATE: &str = "Date must be a valid ISO-8601 date";

/// Raw filter parameters, exactly as received.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilterParams {
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

impl ReportFilterParams {
    /// Drops empty values, sanitises the text criteria and checks the date bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidParameter`] if `fromDate` or `toDate` is not a valid
    /// `YYYY-MM-DD` or `YYYY-MM-DDTHH:mm:ss(.sss)Z` date.
    pub fn into_filter(self) -> ReportResult<ReportFilter> {
        let from_date = present(self.from_date);
        let to_date = present(self.to_date);

        for (name, value) in [("fromDate", &from_date), ("toDate", &to_date)] {
            if let Some(value) = value {
                if !is_valid_date_string(value) {
                    return Err(ReportError::InvalidParameter(format!(
                        "Invalid {name} format. {INVALID_DATE_HINT}"
                    )));
                }
            }
        }

        Ok(ReportFilter {
            patient_name: present(self.patient_name).map(|v| sanitize_string(&v)),
            patient_id: present(self.patient_id).map(|v| sanitize_string(&v)),
            report_type: present(self.report_type).map(|v| sanitize_string(&v)),
            from_date,
            to_date,
        })
    }
}

/// Raw pagination parameters, exactly as received.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

impl PaginationParams {
    /// Parses the page window and ordering.
    ///
    /// Missing values take their defaults. An unknown `sortBy` falls back to `date` and an
    /// unknown `sortDirection` falls back to `desc`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidParameter`] if `limit` is not an integer in
    /// `1..=100` or `offset` is not a non-negative integer.
    pub fn into_options(self) -> ReportResult<PageOptions> {
        let limit = match present(self.limit) {
            None => DEFAULT_PAGE_LIMIT,
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|limit| (1..=MAX_PAGE_LIMIT).contains(limit))
                .ok_or_else(|| {
                    ReportError::InvalidParameter(format!(
                        "Limit must be a number between 1 and {MAX_PAGE_LIMIT}"
                    ))
                })?,
        };

        let offset = match present(self.offset) {
            None => 0,
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                ReportError::InvalidParameter("Offset must be a non-negative number".into())
            })?,
        };

        let sort_by = self
            .sort_by
            .as_deref()
            .map(SortField::parse_or_default)
            .unwrap_or_default();
        let sort_direction = self
            .sort_direction
            .as_deref()
            .map(SortDirection::parse_or_default)
            .unwrap_or_default();

        PageOptions::new(limit, offset, sort_by, sort_direction)
    }
}

/// Trims `input` and strips angle brackets.
pub fn sanitize_string(input: &str) -> String {
    input.trim().replace(['<', '>'], "")
}

/// True if `value` is `YYYY-MM-DD` or `YYYY-MM-DDTHH:mm:ss(.sss)Z` and names a real instant.
pub fn is_valid_date_string(value: &str) -> bool {
    has_date_shape(value) && parse_instant(value).is_some()
}

fn has_date_shape(value: &str) -> bool {
    const DATE: &str = "dddd-dd-dd";
    const DATE_TIME: &str = "dddd-dd-ddTdd:dd:ddZ";
    const DATE_TIME_MILLIS: &str = "dddd-dd-ddTdd:dd:dd.dddZ";

    [DATE, DATE_TIME, DATE_TIME_MILLIS]
        .into_iter()
        .any(|shape| matches_shape(value, shape))
}

// `d` in `shape` stands for any ASCII digit; every other byte must match exactly.
fn matches_shape(value: &str, shape: &str) -> bool {
    value.len() == shape.len()
        && value
            .bytes()
            .zip(shape.bytes())
            .all(|(v, s)| if s == b'd' { v.is_ascii_digit() } else { v == s })
}

/// Checks the fields a new report must carry.
///
/// Every failing field contributes a message; messages are joined with `", "`.
///
/// # Errors
///
/// Returns [`ReportError::Validation`] if `patientName` or `summary` is missing or outside its
/// length range, or if a supplied `date` is not an ISO-8601 instant.
pub fn validate_new_report(draft: &ReportDraft) -> ReportResult<()> {
    let mut problems = Vec::new();

    let (min, max) = PATIENT_NAME_LENGTH;
    if NonEmptyText::bounded(draft.patient_name.as_deref().unwrap_or_default(), min, max).is_err()
    {
        problems.push(format!(
            "Patient name is required and must be between {min} and {max} characters"
        ));
    }

    let (min, max) = SUMMARY_LENGTH;
    if NonEmptyText::bounded(draft.summary.as_deref().unwrap_or_default(), min, max).is_err() {
        problems.push(format!(
            "Summary is required and must be between {min} and {max} characters"
        ));
    }

    if !is_valid_report_date(draft.date.as_deref()) {
        problems.push(INVALID_REPORT_DATE.into());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ReportError::Validation(problems.join(", ")))
    }
}

/// Checks the fields an update may overwrite.
///
/// # Errors
///
/// Returns [`ReportError::Validation`] if a supplied `date` is not an ISO-8601 instant.
pub fn validate_report_patch(patch: &ReportPatch) -> ReportResult<()> {
    if is_valid_report_date(patch.date.as_deref()) {
        Ok(())
    } else {
        Err(ReportError::Validation(INVALID_REPORT_DATE.into()))
    }
}

// Absent and empty dates are filled in or ignored downstream.
fn is_valid_report_date(date: Option<&str>) -> bool {
    match date {
        None | Some("") => true,
        Some(date) => parse_instant(date).is_some(),
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
