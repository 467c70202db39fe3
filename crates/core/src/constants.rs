//! Constants used throughout the report core crate.
//!
//! Storage filenames, defaults filled in by the model, and the bounds applied when validating
//! request parameters all live here so the REST layer, the CLI and the core agree on them.

/// Default directory for snapshot files when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Snapshot filename for the report collection.
pub const REPORTS_FILENAME: &str = "reports.json";

/// Default interval between snapshot attempts, in milliseconds.
pub const DEFAULT_PERSIST_INTERVAL_MS: u64 = 60_000;

/// Report category used when a report is created without one.
pub const DEFAULT_REPORT_TYPE: &str = "General";

/// Page size used when the caller does not supply one.
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Summary keywords that flag a report as carrying a medical alert.
pub const MEDICAL_ALERT_KEYWORDS: [&str; 2] = ["tachycardia", "arrhythmia"];

/// Accepted length range (in characters) for a new report's patient name.
pub const PATIENT_NAME_LENGTH: (usize, usize) = (2, 100);

/// Accepted length range (in characters) for a new report's summary.
pub const SUMMARY_LENGTH: (usize, usize) = (10, 2000);
