//! Report filter criteria.
//!
//! A [`ReportFilter`] holds already-validated filter values. [`ReportPredicate::from_filter`]
//! turns it into a list of independent [`Criterion`]s, normalising the comparison values
//! (lower-cased name, parsed date bounds) once so the per-report test is cheap. A report
//! matches when every criterion holds.

use crate::report::{parse_instant, Report};
use chrono::{DateTime, Utc};

/// Filter values supplied by a caller. `None` (or an empty string) imposes no constraint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    pub report_type: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

impl ReportFilter {
    /// Filter matching reports whose patient name contains `patient_name`.
    pub fn by_patient_name(patient_name: impl Into<String>) -> Self {
        Self {
            patient_name: Some(patient_name.into()),
            ..Default::default()
        }
    }

    /// True when no criterion is set.
    pub fn is_empty(&self) -> bool {
        [
            &self.patient_name,
            &self.patient_id,
            &self.report_type,
            &self.from_date,
            &self.to_date,
        ]
        .into_iter()
        .all(|value| value.as_deref().map_or(true, str::is_empty))
    }
}

/// One filter dimension, with its comparison value already normalised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Criterion {
    /// Case-insensitive substring of `patientName`. Holds the lower-cased needle.
    PatientNameContains(String),
    PatientIdEquals(String),
    TypeEquals(String),
    /// `date` at or after the bound.
    DateOnOrAfter(DateTime<Utc>),
    /// `date` at or before the bound.
    DateOnOrBefore(DateTime<Utc>),
}

impl Criterion {
    pub fn matches(&self, report: &Report) -> bool {
        match self {
            Criterion::PatientNameContains(needle) => {
                report.patient_name.to_lowercase().contains(needle.as_str())
            }
            Criterion::PatientIdEquals(patient_id) => report.patient_id == *patient_id,
            Criterion::TypeEquals(report_type) => report.report_type == *report_type,
            Criterion::DateOnOrAfter(bound) => report.date_instant().is_some_and(|d| d >= *bound),
            Criterion::DateOnOrBefore(bound) => report.date_instant().is_some_and(|d| d <= *bound),
        }
    }
}

/// Conjunction of criteria built from a [`ReportFilter`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportPredicate {
    criteria: Vec<Criterion>,
}

impl ReportPredicate {
    /// Builds the predicate for `filter`.
    ///
    /// Empty strings are skipped. A date bound that does not parse is skipped too; bounds are
    /// expected to have been validated before they get here.
    pub fn from_filter(filter: &ReportFilter) -> Self {
        let mut criteria = Vec::new();

        if let Some(name) = non_empty(&filter.patient_name) {
            criteria.push(Criterion::PatientNameContains(name.to_lowercase()));
        }
        if let Some(patient_id) = non_empty(&filter.patient_id) {
            criteria.push(Criterion::PatientIdEquals(patient_id.to_string()));
        }
        if let Some(report_type) = non_empty(&filter.report_type) {
            criteria.push(Criterion::TypeEquals(report_type.to_string()));
        }
        if let Some(bound) = non_empty(&filter.from_date).and_then(parse_instant) {
            criteria.push(Criterion::DateOnOrAfter(bound));
        }
        if let Some(bound) = non_empty(&filter.to_date).and_then(parse_instant) {
            criteria.push(Criterion::DateOnOrBefore(bound));
        }

        Self { criteria }
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    /// True when the predicate accepts every report.
    pub fn is_unconstrained(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn matches(&self, report: &Report) -> bool {
        self.criteria.iter().all(|criterion| criterion.matches(report))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
