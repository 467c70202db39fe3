//! Repository facades over the storage engines.
//!
//! Repositories hold a handle to a storage engine and add the query semantics the service
//! layer relies on. They contain no API concerns; HTTP mapping belongs in `api-rest`.

pub mod report;

pub use report::ReportRepository;
