//! Sorting for report listings.

use crate::report::{parse_instant, Report};
use crate::ReportError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Fields a listing may be sorted by.
///
/// Timestamp fields compare as instants; the others compare as raw strings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Date,
    PatientName,
    Type,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Date,
        SortField::PatientName,
        SortField::Type,
        SortField::CreatedAt,
        SortField::UpdatedAt,
    ];

    /// Wire name of the field, as used in query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Date => "date",
            SortField::PatientName => "patientName",
            SortField::Type => "type",
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
        }
    }

    /// Parses a wire name, falling back to the default field for anything unknown.
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    pub fn compare(self, a: &Report, b: &Report) -> Ordering {
        match self {
            SortField::Date => compare_instants(&a.date, &b.date),
            SortField::PatientName => a.patient_name.cmp(&b.patient_name),
            SortField::Type => a.report_type.cmp(&b.report_type),
            SortField::CreatedAt => compare_instants(&a.created_at, &b.created_at),
            SortField::UpdatedAt => compare_instants(&a.updated_at, &b.updated_at),
        }
    }
}

impl FromStr for SortField {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ReportError::InvalidParameter(format!("unsupported sort field '{s}'")))
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Parses `asc`/`desc`, falling back to descending for anything else.
    pub fn parse_or_default(value: &str) -> Self {
        match value {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => SortDirection::default(),
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sorts `reports` in place. Equal keys keep their relative order in either direction.
pub fn sort_reports(reports: &mut [Report], field: SortField, direction: SortDirection) {
    reports.sort_by(|a, b| direction.apply(field.compare(a, b)));
}

// Unparseable timestamps sort before every valid one.
fn compare_instants(a: &str, b: &str) -> Ordering {
    parse_instant(a).cmp(&parse_instant(b))
}
