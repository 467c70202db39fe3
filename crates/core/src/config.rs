//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the storage engine. Environment variables are read by the binaries only; the
//! helpers here turn their raw values into typed settings so request handling never touches
//! process-wide state.

use crate::constants::{DEFAULT_PERSIST_INTERVAL_MS, REPORTS_FILENAME};
use crate::{ReportError, ReportResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    persistence_enabled: bool,
    persist_interval: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidInput` if `persist_interval` is zero.
    pub fn new(
        data_dir: PathBuf,
        persistence_enabled: bool,
        persist_interval: Duration,
    ) -> ReportResult<Self> {
        if persist_interval.is_zero() {
            return Err(ReportError::InvalidInput(
                "persist interval must be greater than zero".into(),
            ));
        }

        Ok(Self {
            data_dir,
            persistence_enabled,
            persist_interval,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn persistence_enabled(&self) -> bool {
        self.persistence_enabled
    }

    pub fn persist_interval(&self) -> Duration {
        self.persist_interval
    }

    /// Location of the report snapshot file.
    pub fn reports_file(&self) -> PathBuf {
        self.data_dir.join(REPORTS_FILENAME)
    }
}

/// Parse the persistence switch from an optional string value.
///
/// If `value` is `None` or empty/whitespace, persistence is enabled.
pub fn persistence_enabled_from_env_value(value: Option<String>) -> ReportResult<bool> {
    let value = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    match value.as_deref() {
        None | Some("true") | Some("1") | Some("yes") => Ok(true),
        Some("false") | Some("0") | Some("no") => Ok(false),
        Some(other) => Err(ReportError::InvalidInput(format!(
            "PERSISTENCE_ENABLED must be true or false, got '{other}'"
        ))),
    }
}

/// Parse the snapshot interval (milliseconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default of one minute.
pub fn persist_interval_from_env_value(value: Option<String>) -> ReportResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let millis = match value {
        Some(v) => v.parse::<u64>().map_err(|_| {
            ReportError::InvalidInput(format!(
                "PERSIST_INTERVAL_MS must be a positive integer, got '{v}'"
            ))
        })?,
        None => DEFAULT_PERSIST_INTERVAL_MS,
    };

    if millis == 0 {
        return Err(ReportError::InvalidInput(
            "PERSIST_INTERVAL_MS must be greater than zero".into(),
        ));
    }

    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_interval() {
        let result = CoreConfig::new(PathBuf::from("data"), true, Duration::ZERO);
        assert!(matches!(result, Err(ReportError::InvalidInput(_))));
    }

    #[test]
    fn test_reports_file_is_inside_data_dir() {
        let cfg = CoreConfig::new(PathBuf::from("/srv/reports"), true, Duration::from_secs(1))
            .expect("CoreConfig::new should succeed");
        assert_eq!(cfg.reports_file(), PathBuf::from("/srv/reports/reports.json"));
    }

    #[test]
    fn test_persistence_enabled_defaults_to_true() {
        assert!(persistence_enabled_from_env_value(None).unwrap());
        assert!(persistence_enabled_from_env_value(Some("  ".into())).unwrap());
        assert!(!persistence_enabled_from_env_value(Some("FALSE".into())).unwrap());
        assert!(persistence_enabled_from_env_value(Some("maybe".into())).is_err());
    }

    #[test]
    fn test_persist_interval_parsing() {
        assert_eq!(
            persist_interval_from_env_value(None).unwrap(),
            Duration::from_millis(DEFAULT_PERSIST_INTERVAL_MS)
        );
        assert_eq!(
            persist_interval_from_env_value(Some("250".into())).unwrap(),
            Duration::from_millis(250)
        );
        assert!(persist_interval_from_env_value(Some("0".into())).is_err());
        assert!(persist_interval_from_env_value(Some("soon".into())).is_err());
    }
}
