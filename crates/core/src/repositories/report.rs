//! Report repository.
//!
//! [`ReportRepository`] is the only way the service layer reaches stored reports. It owns the
//! filter semantics (see [`crate::query::filter`]) and composes the storage engine with the
//! sort/slice pipeline behind [`ReportRepository::find_with_pagination`].
//!
//! Targeted writes (`update`, `delete`) report a missing id as [`ReportError::NotFound`]; bulk
//! reads never fail.

use crate::query::{paginate_reports, Page, PageOptions, ReportFilter, ReportPredicate};
use crate::report::{Report, ReportDraft, ReportPatch};
use crate::storage::{InMemoryStorage, StorageEngine};
use crate::{ReportError, ReportResult};
use chrono::Utc;
use std::sync::Arc;

/// Repository over a report storage engine.
///
/// Cloning is cheap; clones share the same engine.
pub struct ReportRepository<S = InMemoryStorage<Report>> {
    storage: Arc<S>,
}

impl<S> Clone for ReportRepository<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: StorageEngine<Report>> ReportRepository<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Every report matching `filter`, or every report when `filter` is `None`.
    pub fn find_all(&self, filter: Option<&ReportFilter>) -> Vec<Report> {
        match predicate_for(filter) {
            None => self.storage.get_all(),
            Some(predicate) => self
                .storage
                .query(&|report: &Report| predicate.matches(report)),
        }
    }

    pub fn find_by_id(&self, id: &str) -> Option<Report> {
        self.storage.get_by_id(id)
    }

    /// Stores a new report built from `draft`, filling defaults for anything missing.
    pub fn create(&self, draft: ReportDraft) -> Report {
        let report = Report::from_draft(draft, Utc::now());
        tracing::debug!("creating report {}", report.id);
        self.storage.create(report)
    }

    /// Applies `patch` to the report with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::NotFound`] if no report has this id.
    pub fn update(&self, id: &str, patch: ReportPatch) -> ReportResult<Report> {
        self.storage
            .update(id, patch)
            .ok_or_else(|| ReportError::not_found(id))
    }

    /// Removes the report with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::NotFound`] if no report has this id.
    pub fn delete(&self, id: &str) -> ReportResult<()> {
        if self.storage.delete(id) {
            Ok(())
        } else {
            Err(ReportError::not_found(id))
        }
    }

    pub fn count(&self, filter: Option<&ReportFilter>) -> usize {
        match predicate_for(filter) {
            None => self.storage.count(None),
            Some(predicate) => self
                .storage
                .count(Some(&|report: &Report| predicate.matches(report))),
        }
    }

    /// Filters, sorts and slices in one pass over the store.
    ///
    /// `total` in the returned page is the number of matches before slicing. When nothing
    /// matches the result is [`Page::empty`].
    pub fn find_with_pagination(
        &self,
        filter: Option<&ReportFilter>,
        options: Option<&PageOptions>,
    ) -> Page<Report> {
        let options = options.copied().unwrap_or_default();
        let matches = self.find_all(filter);

        tracing::debug!(
            matches = matches.len(),
            limit = options.limit(),
            offset = options.offset(),
            sort_by = %options.sort_by(),
            sort_direction = %options.sort_direction(),
            "paginating reports"
        );

        paginate_reports(matches, &options)
    }
}

impl ReportRepository<InMemoryStorage<Report>> {
    /// Loads the snapshot and starts background persistence.
    pub async fn initialize(&self) {
        self.storage.initialize().await;
    }

    /// Stops background persistence and writes a final snapshot if anything changed.
    pub async fn close(&self) {
        self.storage.close().await;
    }
}

fn predicate_for(filter: Option<&ReportFilter>) -> Option<ReportPredicate> {
    filter
        .map(ReportPredicate::from_filter)
        .filter(|predicate| !predicate.is_unconstrained())
}
