//! Report service.
//!
//! Application-level operations over [`ReportRepository`]: lookups that fail loudly when a
//! report is missing, create-time validation and the patient/alert convenience queries used by
//! the REST API and the CLI.

use crate::constants::MEDICAL_ALERT_KEYWORDS;
use crate::query::{sort_reports, Page, PageOptions, ReportFilter, SortDirection, SortField};
use crate::report::{Report, ReportDraft, ReportPatch};
use crate::repositories::ReportRepository;
use crate::storage::{InMemoryStorage, StorageEngine};
use crate::validation::{validate_new_report, validate_report_patch};
use crate::{ReportError, ReportResult};

pub struct ReportService<S = InMemoryStorage<Report>> {
    repository: ReportRepository<S>,
}

impl<S> Clone for ReportService<S> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
        }
    }
}

impl<S: StorageEngine<Report>> ReportService<S> {
    pub fn new(repository: ReportRepository<S>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &ReportRepository<S> {
        &self.repository
    }

    /// One page of reports matching `filter`.
    pub fn get_reports(
        &self,
        filter: Option<&ReportFilter>,
        options: Option<&PageOptions>,
    ) -> Page<Report> {
        self.repository.find_with_pagination(filter, options)
    }

    /// # Errors
    ///
    /// Returns [`ReportError::NotFound`] if no report has this id.
    pub fn get_report_by_id(&self, id: &str) -> ReportResult<Report> {
        self.repository
            .find_by_id(id)
            .ok_or_else(|| ReportError::not_found(id))
    }

    /// Validates `draft` and stores the new report.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Validation`] if the patient name or summary is missing or outside
    /// its length range, or the date is not an ISO-8601 instant.
    pub fn create_report(&self, draft: ReportDraft) -> ReportResult<Report> {
        validate_new_report(&draft)?;
        let report = self.repository.create(draft);
        tracing::info!("created report {}", report.id);
        Ok(report)
    }

    /// # Errors
    ///
    /// Returns [`ReportError::Validation`] if the new date is not an ISO-8601 instant, or
    /// [`ReportError::NotFound`] if no report has this id.
    pub fn update_report(&self, id: &str, patch: ReportPatch) -> ReportResult<Report> {
        validate_report_patch(&patch)?;
        let report = self.repository.update(id, patch)?;
        tracing::info!("updated report {}", report.id);
        Ok(report)
    }

    /// # Errors
    ///
    /// Returns [`ReportError::NotFound`] if no report has this id.
    pub fn delete_report(&self, id: &str) -> ReportResult<()> {
        self.repository.delete(id)?;
        tracing::info!("deleted report {id}");
        Ok(())
    }

    /// One page of reports whose patient name contains `patient_name` (case-insensitive).
    pub fn get_patient_reports(
        &self,
        patient_name: &str,
        options: Option<&PageOptions>,
    ) -> Page<Report> {
        let filter = ReportFilter::by_patient_name(patient_name);
        self.repository.find_with_pagination(Some(&filter), options)
    }

    /// Every report whose summary mentions a medical alert keyword, newest first.
    pub fn get_reports_with_medical_alerts(&self) -> Vec<Report> {
        let mut alerts: Vec<Report> = self
            .repository
            .find_all(None)
            .into_iter()
            .filter(has_medical_alert)
            .collect();
        sort_reports(&mut alerts, SortField::Date, SortDirection::Desc);
        alerts
    }
}

impl ReportService<InMemoryStorage<Report>> {
    pub async fn initialize(&self) {
        self.repository.initialize().await;
    }

    pub async fn close(&self) {
        self.repository.close().await;
    }
}

/// True when the report summary mentions any alert keyword, ignoring case.
pub fn has_medical_alert(report: &Report) -> bool {
    let summary = report.summary.to_lowercase();
    MEDICAL_ALERT_KEYWORDS
        .iter()
        .any(|keyword| summary.contains(keyword))
}
