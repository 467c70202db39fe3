//! # Report Core
//!
//! Core business logic for the patient report portal.
//!
//! This crate contains pure data operations:
//! - The [`Report`] entity and its default-filling rules
//! - A keyed in-memory storage engine with periodic JSON snapshots under `DATA_DIR`
//! - The filter → sort → paginate query pipeline behind report listings
//! - The repository facade and the service layer used by the binaries
//!
//! **No API concerns**: HTTP servers, routing and response shaping belong in `api-rest` or
//! `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod query;
pub mod report;
pub mod repositories;
pub mod service;
pub mod storage;
pub mod validation;

pub use config::CoreConfig;
pub use constants::*;
pub use error::{ReportError, ReportResult};
pub use query::{Page, PageOptions, ReportFilter, SortDirection, SortField};
pub use report::{Report, ReportDraft, ReportPatch};
pub use repositories::ReportRepository;
pub use service::ReportService;
pub use storage::{Entity, InMemoryStorage, StorageEngine};
pub use validation::{PaginationParams, ReportFilterParams};

pub use report_types::{NonEmptyText, TextError};
