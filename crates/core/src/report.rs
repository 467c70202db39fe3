//! The report entity.
//!
//! A [`Report`] is the stored, fully-populated record. Callers build one from a
//! [`ReportDraft`] (missing fields take defaults) and change one with a [`ReportPatch`]
//! (only supplied fields change, `updatedAt` always moves forward).
//!
//! Timestamps are kept as ISO-8601 strings exactly as they appear in the snapshot file;
//! [`parse_instant`] turns them into instants where ordering or range checks need one.

use crate::constants::DEFAULT_REPORT_TYPE;
use crate::storage::Entity;
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A single patient report as stored and returned to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub patient_name: String,
    pub patient_id: String,
    pub date: String,
    pub summary: String,
    #[serde(rename = "type")]
    pub report_type: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a report. Every field is optional; absent or empty values take defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportDraft {
    pub id: Option<String>,
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    pub date: Option<String>,
    pub summary: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Changes to apply to an existing report.
///
/// `id` and `createdAt` are not patchable. Empty strings count as "not supplied".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportPatch {
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    pub date: Option<String>,
    pub summary: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
}

impl Report {
    /// Builds a report from a draft, filling in defaults for anything missing.
    ///
    /// `now` supplies the default `date`, `createdAt` and `updatedAt`.
    pub fn from_draft(draft: ReportDraft, now: DateTime<Utc>) -> Self {
        let stamp = format_instant(now);

        let created_at = supplied(draft.created_at).unwrap_or_else(|| stamp.clone());
        let updated_at = supplied(draft.updated_at).unwrap_or_else(|| stamp.clone());

        let mut report = Self {
            id: supplied(draft.id).unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            patient_name: supplied(draft.patient_name).unwrap_or_default(),
            patient_id: supplied(draft.patient_id).unwrap_or_default(),
            date: supplied(draft.date).unwrap_or_else(|| stamp.clone()),
            summary: supplied(draft.summary).unwrap_or_default(),
            report_type: supplied(draft.report_type)
                .unwrap_or_else(|| DEFAULT_REPORT_TYPE.to_string()),
            created_at,
            updated_at,
        };

        if let (Some(created), Some(updated)) = (
            parse_instant(&report.created_at),
            parse_instant(&report.updated_at),
        ) {
            if updated < created {
                report.updated_at = report.created_at.clone();
            }
        }

        report
    }

    /// Overwrites the fields supplied in `patch` and refreshes `updatedAt`.
    pub fn apply(&mut self, patch: ReportPatch, now: DateTime<Utc>) {
        if let Some(patient_name) = supplied(patch.patient_name) {
            self.patient_name = patient_name;
        }
        if let Some(patient_id) = supplied(patch.patient_id) {
            self.patient_id = patient_id;
        }
        if let Some(date) = supplied(patch.date) {
            self.date = date;
        }
        if let Some(summary) = supplied(patch.summary) {
            self.summary = summary;
        }
        if let Some(report_type) = supplied(patch.report_type) {
            self.report_type = report_type;
        }
        self.touch(now);
    }

    /// Sets `updatedAt` to `now`, never moving it behind its previous value or `createdAt`.
    fn touch(&mut self, now: DateTime<Utc>) {
        let floor = [&self.updated_at, &self.created_at]
            .into_iter()
            .filter_map(|t| parse_instant(t))
            .max();

        let stamp = match floor {
            Some(previous) if previous > now => previous,
            _ => now,
        };
        self.updated_at = format_instant(stamp);
    }

    /// Parsed clinical event date, if `date` holds a valid instant.
    pub fn date_instant(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.date)
    }
}

impl Entity for Report {
    type Patch = ReportPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn merge(&mut self, patch: ReportPatch) {
        self.apply(patch, Utc::now());
    }
}

impl ReportPatch {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        [
            &self.patient_name,
            &self.patient_id,
            &self.date,
            &self.summary,
            &self.report_type,
        ]
        .into_iter()
        .all(|field| field.as_deref().map_or(true, str::is_empty))
    }
}

fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Formats an instant the way report timestamps are stored (`2025-03-15T10:30:00.000Z`).
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an ISO-8601 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}
